//! Document Lifecycle Core Library
//!
//! Consolidated business logic for the audit console's document lifecycle:
//! append-only version history and the bounded approval workflow, backed by
//! the remote document service.

pub mod clients;
pub mod config;
pub mod error;
pub mod facade;
pub mod version;
pub mod workflow;

// Re-export main types for easy access
pub use config::{DocumentServiceConfig, LifecycleConfig};
pub use error::{LifecycleError, Result};

// Re-export all client types
pub use clients::{ActionSubmission, DocumentService, DocumentServiceClient};

// Re-export component types
pub use facade::{LifecycleFacade, WorkflowView};
pub use version::{Direction, FileUpload, NewVersion, VersionStore};
pub use workflow::{
    default_pipeline, pipeline_from_names, project_steps, ActionProcessor, ActionRequest,
    WorkflowEngine,
};

// Re-export the shared domain model
pub use lifecycle_types::{
    ActorId, DocumentId, DocumentVersion, DocumentWorkflow, ExecutionRecord, ExecutionStatus,
    FileReference, StepDefinition, StepState, StepView, TemplateId, VersionId, VersionPayload,
    WorkflowAction, WorkflowId, WorkflowStatus,
};
