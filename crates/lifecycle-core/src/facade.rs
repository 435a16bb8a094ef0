//! Lifecycle facade: the single entry point for presentation code
//!
//! Composes the version store, workflow engine, and action processor over
//! one document service. Performs delegation and input shaping only; all
//! business rules live in the composed components and errors pass through
//! unchanged.

use crate::clients::{DocumentService, DocumentServiceClient};
use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, Result};
use crate::version::{Direction, NewVersion, VersionStore};
use crate::workflow::{pipeline_from_names, ActionProcessor, ActionRequest, WorkflowEngine};
use lifecycle_types::{
    ActorId, DocumentId, DocumentVersion, DocumentWorkflow, ExecutionRecord, StepDefinition,
    StepView, VersionId, VersionPayload, WorkflowAction,
};
use std::sync::Arc;

/// Read-only projection of a document's workflow for rendering
#[derive(Debug, Clone)]
pub struct WorkflowView {
    pub workflow: DocumentWorkflow,
    pub steps: Vec<StepView>,
}

impl WorkflowView {
    /// The immutable audit trail, oldest first
    pub fn history(&self) -> &[ExecutionRecord] {
        &self.workflow.execution_history
    }
}

/// Facade over the document lifecycle core
pub struct LifecycleFacade {
    versions: VersionStore,
    engine: WorkflowEngine,
    processor: ActionProcessor,
}

impl LifecycleFacade {
    pub fn new(service: Arc<dyn DocumentService>, pipeline: Vec<StepDefinition>) -> Self {
        let total_steps = pipeline.len() as u32;
        Self {
            versions: VersionStore::new(service.clone()),
            engine: WorkflowEngine::new(service.clone(), pipeline),
            processor: ActionProcessor::new(service, total_steps),
        }
    }

    pub fn with_default_pipeline(service: Arc<dyn DocumentService>) -> Self {
        Self::new(service, crate::workflow::default_pipeline())
    }

    /// Build a facade talking to a live document service
    pub fn from_config(config: &LifecycleConfig) -> Self {
        let service = Arc::new(DocumentServiceClient::new(config.document_service.clone()));
        Self::new(service, pipeline_from_names(&config.pipeline))
    }

    /// List a document's versions, newest first
    pub async fn list_versions(&self, document_id: &DocumentId) -> Result<Vec<DocumentVersion>> {
        self.versions.list_versions(document_id).await
    }

    /// Create a new version from notes and/or an uploaded file
    pub async fn create_version(
        &self,
        document_id: &DocumentId,
        new_version: NewVersion,
    ) -> Result<DocumentVersion> {
        self.versions.create_version(document_id, new_version).await
    }

    /// Point the navigation selection at a specific version
    pub async fn select_version(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<DocumentVersion> {
        self.versions.select_version(document_id, version_id).await
    }

    /// Move the navigation selection one version older or newer
    pub async fn navigate_version(
        &self,
        document_id: &DocumentId,
        direction: Direction,
        from_version_id: &VersionId,
    ) -> Result<DocumentVersion> {
        self.versions
            .navigate(document_id, direction, from_version_id)
            .await
    }

    /// Fetch the text or binary payload of one version
    pub async fn fetch_version_payload(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<VersionPayload> {
        self.versions
            .fetch_version_payload(document_id, version_id)
            .await
    }

    /// Download a version's file plus a suggested filename
    pub async fn download_version(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<(Vec<u8>, String)> {
        self.versions.download_version(document_id, version_id).await
    }

    /// The workflow attached to a document, projected for rendering
    ///
    /// Returns the active workflow when one is in review, the most recent
    /// finished one otherwise, and `None` when the document never entered
    /// review.
    pub async fn workflow_view(&self, document_id: &DocumentId) -> Result<Option<WorkflowView>> {
        let workflow = match self.engine.view_workflow(document_id).await? {
            Some(workflow) => workflow,
            None => return Ok(None),
        };

        let steps = self.engine.derived_steps(&workflow);
        Ok(Some(WorkflowView { workflow, steps }))
    }

    /// Submit an approve/reject action against the document's workflow
    ///
    /// `step_number` defaults to the workflow's current step when not
    /// supplied; passing a stale step fails with `StepMismatch`.
    pub async fn submit_workflow_action(
        &self,
        document_id: &DocumentId,
        action: WorkflowAction,
        step_number: Option<u32>,
        performed_by: ActorId,
        notes: Option<String>,
    ) -> Result<(DocumentWorkflow, ExecutionRecord)> {
        let workflow = self
            .engine
            .view_workflow(document_id)
            .await?
            .ok_or_else(|| {
                LifecycleError::NotFound(format!("document {} has no workflow", document_id))
            })?;

        let request = ActionRequest {
            action,
            step_number: step_number.unwrap_or(workflow.current_step),
            performed_by,
            notes,
        };

        let (updated, record) = self.processor.submit(&workflow, request).await?;
        self.engine.store_updated(updated.clone()).await;

        Ok((updated, record))
    }
}
