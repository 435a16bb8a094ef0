//! Shared types for the document lifecycle core
//!
//! Strongly typed domain model for version history and approval workflows.
//! No string-based state management - everything is strongly typed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Strongly typed DocumentId
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id (test fixtures and fabricated sessions)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed VersionId
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed WorkflowId (one workflow instance)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed TemplateId (the workflow template a run was started from)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed ActorId (the reviewer/auditor performing an action)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pointer to a binary payload held by the document service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub file_id: String,
    pub filename: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// One immutable snapshot in a document's version history
///
/// Versions are append-only: created once, never mutated or deleted. The
/// version with the highest `version_number` is the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub version_number: u32,
    pub content: Option<String>,
    pub file_reference: Option<FileReference>,
    pub created_at: DateTime<Utc>,
}

impl DocumentVersion {
    /// True when the version has neither inline content nor an attached file
    pub fn has_payload(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty()) || self.file_reference.is_some()
    }
}

/// Workflow lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    NotStarted,
    InProgress,
    Completed,
    Rejected,
    TimedOut,
}

impl WorkflowStatus {
    /// Wire representation (matches the document service contract)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::TimedOut => "timed_out",
        }
    }

    /// Terminal states accept no further actions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::TimedOut)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown workflow status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for WorkflowStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "timed_out" => Ok(Self::TimedOut),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Action a reviewer can take against the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Approve,
    Reject,
}

impl WorkflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome recorded on a single execution history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Completed,
    Rejected,
    Pending,
}

/// Immutable audit record of one approve/reject action
///
/// Entries are ordered by `performed_at` and never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub step_number: u32,
    pub action: WorkflowAction,
    pub performed_by: ActorId,
    pub performed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: ExecutionStatus,
}

/// One review/approval workflow instance attached to a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentWorkflow {
    pub id: WorkflowId,
    /// Template the run was started from; serialized as `workflow_id` to
    /// match the document service contract.
    #[serde(rename = "workflow_id")]
    pub template_id: TemplateId,
    pub document_id: DocumentId,
    pub current_step: u32,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub timeout_at: Option<DateTime<Utc>>,
    pub execution_history: Vec<ExecutionRecord>,
}

impl DocumentWorkflow {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Most recent audit record, if any action has been taken
    pub fn last_record(&self) -> Option<&ExecutionRecord> {
        self.execution_history.last()
    }
}

/// Derived position of a pipeline step relative to `current_step`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Complete,
    Current,
    Upcoming,
}

/// One stage in the fixed ordered review pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub number: u32,
    pub name: String,
}

impl StepDefinition {
    pub fn new(number: u32, name: &str) -> Self {
        Self {
            number,
            name: name.to_string(),
        }
    }
}

/// Read-only projection of a step for presentation code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepView {
    pub number: u32,
    pub name: String,
    pub state: StepState,
}

/// Version payload returned by the document service
///
/// The service returns heterogeneous shapes; unknown ones are preserved in
/// the `Unstructured` variant so callers pattern-match exhaustively instead
/// of poking at untyped maps.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionPayload {
    Text(String),
    Binary { bytes: Vec<u8>, filename: String },
    Unstructured(serde_json::Value),
}

impl VersionPayload {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary { bytes, .. } => bytes.len(),
            Self::Unstructured(value) => value.to_string().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
