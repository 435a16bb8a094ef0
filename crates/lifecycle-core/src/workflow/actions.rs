//! Action processor: validate and apply approve/reject actions
//!
//! Each accepted action appends exactly one execution record and performs
//! the corresponding state transition. The transition is computed on a copy
//! and only becomes observable once the document service has committed it,
//! so a failed submission leaves no trace.

use crate::clients::{ActionSubmission, DocumentService};
use crate::error::{LifecycleError, Result};
use chrono::{DateTime, Utc};
use lifecycle_types::{
    ActorId, DocumentWorkflow, ExecutionRecord, ExecutionStatus, WorkflowAction, WorkflowId,
    WorkflowStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One approve/reject action against a workflow step
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: WorkflowAction,
    pub step_number: u32,
    pub performed_by: ActorId,
    pub notes: Option<String>,
}

/// Validates and applies actions against the document service
pub struct ActionProcessor {
    service: Arc<dyn DocumentService>,
    total_steps: u32,
    // One lock per workflow; the StepMismatch guard in apply() remains the
    // correctness backstop for submissions racing outside this process.
    submit_locks: std::sync::Mutex<HashMap<WorkflowId, Arc<Mutex<()>>>>,
}

impl ActionProcessor {
    pub fn new(service: Arc<dyn DocumentService>, total_steps: u32) -> Self {
        Self {
            service,
            total_steps,
            submit_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn submit_lock(&self, workflow_id: &WorkflowId) -> Arc<Mutex<()>> {
        let mut locks = self
            .submit_locks
            .lock()
            .expect("action processor lock map poisoned");
        locks
            .entry(workflow_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Pure transition: validate the request and compute the updated
    /// workflow plus its new execution record
    ///
    /// Fails with `InvalidState` when the workflow is not `in_progress` and
    /// with `StepMismatch` when the request targets a stale step. Neither
    /// failure touches the input.
    pub fn apply(
        workflow: &DocumentWorkflow,
        request: &ActionRequest,
        total_steps: u32,
        now: DateTime<Utc>,
    ) -> Result<(DocumentWorkflow, ExecutionRecord)> {
        if !workflow.is_active() {
            return Err(LifecycleError::InvalidState(format!(
                "workflow {} is {} and accepts no further actions",
                workflow.id, workflow.status
            )));
        }

        if request.step_number != workflow.current_step {
            return Err(LifecycleError::StepMismatch {
                expected: workflow.current_step,
                submitted: request.step_number,
            });
        }

        let record = ExecutionRecord {
            step_number: request.step_number,
            action: request.action,
            performed_by: request.performed_by.clone(),
            performed_at: now,
            notes: request.notes.clone(),
            status: match request.action {
                WorkflowAction::Approve => ExecutionStatus::Completed,
                WorkflowAction::Reject => ExecutionStatus::Rejected,
            },
        };

        let mut updated = workflow.clone();
        updated.execution_history.push(record.clone());

        match request.action {
            WorkflowAction::Approve if workflow.current_step >= total_steps => {
                updated.status = WorkflowStatus::Completed;
                updated.completed_at = Some(now);
            }
            WorkflowAction::Approve => {
                updated.current_step += 1;
            }
            WorkflowAction::Reject => {
                // Reject terminates the workflow; the step is not reset
                updated.status = WorkflowStatus::Rejected;
            }
        }

        Ok((updated, record))
    }

    /// Submit an action to the document service; serialized per workflow
    ///
    /// Returns the committed workflow and the record the action produced.
    pub async fn submit(
        &self,
        workflow: &DocumentWorkflow,
        request: ActionRequest,
    ) -> Result<(DocumentWorkflow, ExecutionRecord)> {
        let lock = self.submit_lock(&workflow.id);
        let _guard = lock.lock().await;

        let now = Utc::now();

        // Validation gate: reject locally before any network traffic
        let (expected, local_record) = Self::apply(workflow, &request, self.total_steps, now)?;

        let submission = ActionSubmission {
            action: request.action,
            step_number: request.step_number,
            performed_by: request.performed_by,
            notes: request.notes,
        };

        let updated = self
            .service
            .submit_workflow_action(&workflow.document_id, &workflow.id, &submission)
            .await?;

        if updated.status != expected.status || updated.current_step != expected.current_step {
            log::warn!(
                "Service transition for workflow {} diverged: expected {}/step {}, got {}/step {}",
                workflow.id,
                expected.status,
                expected.current_step,
                updated.status,
                updated.current_step
            );
        }

        let record = updated.last_record().cloned().unwrap_or(local_record);

        log::info!(
            "Workflow {} (document {}): {} on step {} -> {}",
            updated.id,
            updated.document_id,
            record.action,
            record.step_number,
            updated.status
        );

        Ok((updated, record))
    }
}
