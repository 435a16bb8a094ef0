//! In-memory document service used by the integration tests
//!
//! Behaves like the real service: it owns the data, assigns version
//! numbers, and enforces workflow transitions server-side. Version-number
//! assignment is deliberately split into a read and a delayed commit so an
//! unserialized client would produce duplicates.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use lifecycle_core::{ActionSubmission, DocumentService, LifecycleError, Result};
use lifecycle_types::{
    DocumentId, DocumentVersion, DocumentWorkflow, ExecutionRecord, ExecutionStatus,
    FileReference, TemplateId, VersionId, VersionPayload, WorkflowAction, WorkflowId,
    WorkflowStatus,
};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct MockState {
    documents: HashSet<DocumentId>,
    versions: HashMap<DocumentId, Vec<DocumentVersion>>,
    workflows: HashMap<DocumentId, Vec<DocumentWorkflow>>,
    payloads: HashMap<VersionId, Vec<u8>>,
}

pub struct MockDocumentService {
    state: Mutex<MockState>,
    pipeline_len: u32,
    create_delay: Duration,
}

impl MockDocumentService {
    pub fn new() -> Self {
        Self::with_pipeline_len(4)
    }

    pub fn with_pipeline_len(pipeline_len: u32) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            pipeline_len,
            create_delay: Duration::from_millis(2),
        }
    }

    pub async fn register_document(&self, document_id: &DocumentId) {
        let mut state = self.state.lock().await;
        state.documents.insert(document_id.clone());
    }

    pub async fn seed_workflow(&self, workflow: DocumentWorkflow) {
        let mut state = self.state.lock().await;
        state.documents.insert(workflow.document_id.clone());
        state
            .workflows
            .entry(workflow.document_id.clone())
            .or_default()
            .push(workflow);
    }

    pub async fn stored_workflow(&self, workflow_id: &WorkflowId) -> Option<DocumentWorkflow> {
        let state = self.state.lock().await;
        state
            .workflows
            .values()
            .flatten()
            .find(|w| &w.id == workflow_id)
            .cloned()
    }

    fn ensure_document(state: &MockState, document_id: &DocumentId) -> Result<()> {
        if state.documents.contains(document_id) {
            Ok(())
        } else {
            Err(LifecycleError::NotFound(format!(
                "document {}",
                document_id
            )))
        }
    }

    fn next_number(state: &MockState, document_id: &DocumentId) -> u32 {
        state
            .versions
            .get(document_id)
            .and_then(|versions| versions.iter().map(|v| v.version_number).max())
            .unwrap_or(0)
            + 1
    }
}

/// Build an in-progress workflow at step 1 for tests
pub fn in_progress_workflow(document_id: &DocumentId) -> DocumentWorkflow {
    DocumentWorkflow {
        id: WorkflowId::generate(),
        template_id: TemplateId::new("audit-review"),
        document_id: document_id.clone(),
        current_step: 1,
        status: WorkflowStatus::InProgress,
        started_at: Utc::now(),
        completed_at: None,
        timeout_at: None,
        execution_history: Vec::new(),
    }
}

#[async_trait]
impl DocumentService for MockDocumentService {
    async fn list_versions(&self, document_id: &DocumentId) -> Result<Vec<DocumentVersion>> {
        let state = self.state.lock().await;
        Self::ensure_document(&state, document_id)?;

        let mut versions = state
            .versions
            .get(document_id)
            .cloned()
            .unwrap_or_default();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn create_note_version(
        &self,
        document_id: &DocumentId,
        content: &str,
    ) -> Result<DocumentVersion> {
        // Read the sequence, then commit after a gap: a server-assigned
        // sequence with no conflict detection.
        let number = {
            let state = self.state.lock().await;
            Self::ensure_document(&state, document_id)?;
            Self::next_number(&state, document_id)
        };

        tokio::time::sleep(self.create_delay).await;

        let version = DocumentVersion {
            id: VersionId::generate(),
            document_id: document_id.clone(),
            version_number: number,
            content: Some(content.to_string()),
            file_reference: None,
            created_at: Utc::now(),
        };

        let mut state = self.state.lock().await;
        state
            .versions
            .entry(document_id.clone())
            .or_default()
            .push(version.clone());
        Ok(version)
    }

    async fn create_file_version(
        &self,
        document_id: &DocumentId,
        filename: &str,
        bytes: Vec<u8>,
        notes: Option<&str>,
    ) -> Result<DocumentVersion> {
        let number = {
            let state = self.state.lock().await;
            Self::ensure_document(&state, document_id)?;
            Self::next_number(&state, document_id)
        };

        tokio::time::sleep(self.create_delay).await;

        let version = DocumentVersion {
            id: VersionId::generate(),
            document_id: document_id.clone(),
            version_number: number,
            content: notes.map(|n| n.to_string()),
            file_reference: Some(FileReference {
                file_id: format!("file-{}", number),
                filename: filename.to_string(),
                size_bytes: Some(bytes.len() as u64),
            }),
            created_at: Utc::now(),
        };

        let mut state = self.state.lock().await;
        state.payloads.insert(version.id.clone(), bytes);
        state
            .versions
            .entry(document_id.clone())
            .or_default()
            .push(version.clone());
        Ok(version)
    }

    async fn fetch_version_content(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<VersionPayload> {
        let state = self.state.lock().await;
        Self::ensure_document(&state, document_id)?;

        let version = state
            .versions
            .get(document_id)
            .and_then(|versions| versions.iter().find(|v| &v.id == version_id))
            .ok_or_else(|| LifecycleError::NotFound(format!("version {}", version_id)))?;

        if let Some(bytes) = state.payloads.get(version_id) {
            let filename = version
                .file_reference
                .as_ref()
                .map(|f| f.filename.clone())
                .unwrap_or_else(|| version_id.to_string());
            return Ok(VersionPayload::Binary {
                bytes: bytes.clone(),
                filename,
            });
        }

        match &version.content {
            Some(content) if !content.is_empty() => Ok(VersionPayload::Text(content.clone())),
            _ => Err(LifecycleError::NotFound(format!(
                "version {} has no payload",
                version_id
            ))),
        }
    }

    async fn download_version(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<(Vec<u8>, String)> {
        let state = self.state.lock().await;
        Self::ensure_document(&state, document_id)?;

        let version = state
            .versions
            .get(document_id)
            .and_then(|versions| versions.iter().find(|v| &v.id == version_id))
            .ok_or_else(|| LifecycleError::NotFound(format!("version {}", version_id)))?;

        let bytes = state
            .payloads
            .get(version_id)
            .cloned()
            .ok_or_else(|| LifecycleError::NotFound(format!("version {} file", version_id)))?;

        let filename = version
            .file_reference
            .as_ref()
            .map(|f| f.filename.clone())
            .unwrap_or_else(|| version_id.to_string());

        Ok((bytes, filename))
    }

    async fn list_workflows(&self, document_id: &DocumentId) -> Result<Vec<DocumentWorkflow>> {
        let state = self.state.lock().await;
        Self::ensure_document(&state, document_id)?;
        Ok(state.workflows.get(document_id).cloned().unwrap_or_default())
    }

    async fn submit_workflow_action(
        &self,
        document_id: &DocumentId,
        workflow_id: &WorkflowId,
        submission: &ActionSubmission,
    ) -> Result<DocumentWorkflow> {
        let mut state = self.state.lock().await;
        Self::ensure_document(&state, document_id)?;

        let pipeline_len = self.pipeline_len;
        let workflow = state
            .workflows
            .get_mut(document_id)
            .and_then(|workflows| workflows.iter_mut().find(|w| &w.id == workflow_id))
            .ok_or_else(|| LifecycleError::NotFound(format!("workflow {}", workflow_id)))?;

        // Server-side enforcement mirrors the client guards
        if workflow.status != WorkflowStatus::InProgress {
            return Err(LifecycleError::InvalidState(format!(
                "workflow {} is {}",
                workflow_id, workflow.status
            )));
        }
        if submission.step_number != workflow.current_step {
            return Err(LifecycleError::StepMismatch {
                expected: workflow.current_step,
                submitted: submission.step_number,
            });
        }

        let now = Utc::now();
        workflow.execution_history.push(ExecutionRecord {
            step_number: submission.step_number,
            action: submission.action,
            performed_by: submission.performed_by.clone(),
            performed_at: now,
            notes: submission.notes.clone(),
            status: match submission.action {
                WorkflowAction::Approve => ExecutionStatus::Completed,
                WorkflowAction::Reject => ExecutionStatus::Rejected,
            },
        });

        match submission.action {
            WorkflowAction::Approve if workflow.current_step >= pipeline_len => {
                workflow.status = WorkflowStatus::Completed;
                workflow.completed_at = Some(now);
            }
            WorkflowAction::Approve => {
                workflow.current_step += 1;
            }
            WorkflowAction::Reject => {
                workflow.status = WorkflowStatus::Rejected;
            }
        }

        Ok(workflow.clone())
    }
}
