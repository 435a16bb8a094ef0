//! Workflow engine: active-workflow queries and step-sequencing rules
//!
//! The engine never creates workflows (they are started upstream when a
//! document enters review) and owns no clock; the `timeout_at` deadline is
//! evaluated externally and only reported here.

use super::steps;
use crate::clients::DocumentService;
use crate::error::Result;
use chrono::{DateTime, Utc};
use lifecycle_types::{DocumentId, DocumentWorkflow, StepDefinition, StepView};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Query surface over the single active workflow of a document
pub struct WorkflowEngine {
    service: Arc<dyn DocumentService>,
    pipeline: Vec<StepDefinition>,
    // Last workflow this session observed or wrote, per document.
    // Keeps read-your-writes when the upstream store lags a local action.
    cache: Mutex<HashMap<DocumentId, DocumentWorkflow>>,
}

impl WorkflowEngine {
    pub fn new(service: Arc<dyn DocumentService>, pipeline: Vec<StepDefinition>) -> Self {
        Self {
            service,
            pipeline,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn pipeline(&self) -> &[StepDefinition] {
        &self.pipeline
    }

    pub fn total_steps(&self) -> u32 {
        self.pipeline.len() as u32
    }

    /// The document's active workflow, or `None` when nothing is in review
    ///
    /// At most one workflow per document may be `in_progress`. If the
    /// service reports more (a data anomaly), the most recently started one
    /// wins and the anomaly is logged, never silently repaired.
    pub async fn active_workflow(
        &self,
        document_id: &DocumentId,
    ) -> Result<Option<DocumentWorkflow>> {
        let workflows = self.service.list_workflows(document_id).await?;
        let active = Self::pick_active(document_id, &workflows);
        match active {
            Some(workflow) => Ok(Some(self.reconcile(workflow).await)),
            None => Ok(None),
        }
    }

    /// The workflow a detail view should render: the active one, or the
    /// most recently started terminal one when the review already ended
    pub async fn view_workflow(
        &self,
        document_id: &DocumentId,
    ) -> Result<Option<DocumentWorkflow>> {
        let workflows = self.service.list_workflows(document_id).await?;

        let candidate = match Self::pick_active(document_id, &workflows) {
            Some(active) => Some(active),
            None => workflows
                .into_iter()
                .max_by_key(|w| w.started_at),
        };

        match candidate {
            Some(workflow) => Ok(Some(self.reconcile(workflow).await)),
            None => Ok(None),
        }
    }

    fn pick_active(
        document_id: &DocumentId,
        workflows: &[DocumentWorkflow],
    ) -> Option<DocumentWorkflow> {
        let mut active: Vec<&DocumentWorkflow> =
            workflows.iter().filter(|w| w.is_active()).collect();

        if active.len() > 1 {
            log::warn!(
                "Data anomaly: document {} has {} in_progress workflows; picking most recent",
                document_id,
                active.len()
            );
        }

        active.sort_by_key(|w| w.started_at);
        active.last().map(|w| (*w).clone())
    }

    /// Prefer the locally cached workflow when it is ahead of the fetched
    /// one (a write of ours the upstream read has not caught up with)
    async fn reconcile(&self, fetched: DocumentWorkflow) -> DocumentWorkflow {
        let mut cache = self.cache.lock().await;
        let resolved = match cache.get(&fetched.document_id) {
            Some(cached)
                if cached.id == fetched.id
                    && cached.execution_history.len() > fetched.execution_history.len() =>
            {
                log::debug!(
                    "Serving cached workflow {} ahead of upstream ({} vs {} records)",
                    cached.id,
                    cached.execution_history.len(),
                    fetched.execution_history.len()
                );
                cached.clone()
            }
            _ => fetched,
        };
        cache.insert(resolved.document_id.clone(), resolved.clone());
        resolved
    }

    /// Record a workflow updated by a successful action
    pub(crate) async fn store_updated(&self, workflow: DocumentWorkflow) {
        let mut cache = self.cache.lock().await;
        cache.insert(workflow.document_id.clone(), workflow);
    }

    /// Derived per-step view of the pipeline for a workflow
    pub fn derived_steps(&self, workflow: &DocumentWorkflow) -> Vec<StepView> {
        steps::project_steps(workflow, &self.pipeline)
    }

    /// Whether an action against `step_number` would currently be accepted
    pub fn is_actionable(&self, workflow: &DocumentWorkflow, step_number: u32) -> bool {
        workflow.is_active() && step_number == workflow.current_step
    }

    /// Pure report of the deadline condition; no transition is performed
    pub fn deadline_elapsed(workflow: &DocumentWorkflow, now: DateTime<Utc>) -> bool {
        workflow
            .timeout_at
            .map(|deadline| workflow.is_active() && now > deadline)
            .unwrap_or(false)
    }
}
