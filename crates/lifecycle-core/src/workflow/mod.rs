//! Workflow management module

pub mod actions;
pub mod engine;
pub mod steps;

pub use actions::{ActionProcessor, ActionRequest};
pub use engine::WorkflowEngine;
pub use steps::{default_pipeline, pipeline_from_names, project_steps};
