//! Document service client
//!
//! All persistence lives in the remote document service; this client speaks
//! its JSON/multipart HTTP contract and maps HTTP failures to typed errors.

use crate::config::DocumentServiceConfig;
use crate::error::{LifecycleError, Result};
use async_trait::async_trait;
use lifecycle_types::{
    ActorId, DocumentId, DocumentVersion, DocumentWorkflow, VersionId, VersionPayload,
    WorkflowAction, WorkflowId,
};
use reqwest::{multipart, Client as HttpClient, StatusCode};
use serde::Serialize;

/// Wire shape for submitting an approve/reject action
#[derive(Debug, Clone, Serialize)]
pub struct ActionSubmission {
    pub action: WorkflowAction,
    pub step_number: u32,
    pub performed_by: ActorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Logical operations the core needs from the document service
///
/// This is the seam presentation-independent code is written against; tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// List all versions of a document, newest first
    async fn list_versions(&self, document_id: &DocumentId) -> Result<Vec<DocumentVersion>>;

    /// Create a notes-only version
    async fn create_note_version(
        &self,
        document_id: &DocumentId,
        content: &str,
    ) -> Result<DocumentVersion>;

    /// Create a version carrying an uploaded file, with optional notes
    async fn create_file_version(
        &self,
        document_id: &DocumentId,
        filename: &str,
        bytes: Vec<u8>,
        notes: Option<&str>,
    ) -> Result<DocumentVersion>;

    /// Fetch the text or binary payload of one version
    async fn fetch_version_content(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<VersionPayload>;

    /// Download a version's binary payload plus a suggested filename
    async fn download_version(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<(Vec<u8>, String)>;

    /// List all workflows attached to a document
    async fn list_workflows(&self, document_id: &DocumentId) -> Result<Vec<DocumentWorkflow>>;

    /// Submit an approve/reject action; returns the updated workflow
    async fn submit_workflow_action(
        &self,
        document_id: &DocumentId,
        workflow_id: &WorkflowId,
        submission: &ActionSubmission,
    ) -> Result<DocumentWorkflow>;
}

/// HTTP implementation of [`DocumentService`]
pub struct DocumentServiceClient {
    config: DocumentServiceConfig,
    http_client: HttpClient,
}

impl DocumentServiceClient {
    pub fn new(config: DocumentServiceConfig) -> Self {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        log::info!(
            "DocumentServiceClient configured for endpoint: {}",
            config.base_url
        );

        Self {
            config,
            http_client,
        }
    }

    fn versions_url(&self, document_id: &DocumentId) -> String {
        format!(
            "{}/api/documents/{}/versions",
            self.config.base_url, document_id
        )
    }

    fn workflows_url(&self, document_id: &DocumentId) -> String {
        format!(
            "{}/api/documents/{}/workflows",
            self.config.base_url, document_id
        )
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.config.api_token)
    }

    /// Map a non-success HTTP status to the typed error for `context`
    fn error_for_status(status: StatusCode, context: &str) -> LifecycleError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LifecycleError::Unauthorized(format!("{}: HTTP {}", context, status))
            }
            StatusCode::NOT_FOUND => LifecycleError::NotFound(context.to_string()),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                LifecycleError::Validation(format!("{}: HTTP {}", context, status))
            }
            StatusCode::CONFLICT => {
                LifecycleError::InvalidState(format!("{}: HTTP {}", context, status))
            }
            other => LifecycleError::Network(format!("{}: HTTP {}", context, other)),
        }
    }

    /// Pull `filename="..."` out of a Content-Disposition header value
    fn filename_from_disposition(value: &str) -> Option<String> {
        let marker = "filename=";
        let start = value.find(marker)? + marker.len();
        let rest = value[start..].trim();
        let name = rest.split(';').next()?.trim().trim_matches('"');
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn sort_newest_first(mut versions: Vec<DocumentVersion>) -> Vec<DocumentVersion> {
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        versions
    }
}

#[async_trait]
impl DocumentService for DocumentServiceClient {
    async fn list_versions(&self, document_id: &DocumentId) -> Result<Vec<DocumentVersion>> {
        let response = self
            .http_client
            .get(self.versions_url(document_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(
                response.status(),
                &format!("document {}", document_id),
            ));
        }

        let versions: Vec<DocumentVersion> = response.json().await?;
        Ok(Self::sort_newest_first(versions))
    }

    async fn create_note_version(
        &self,
        document_id: &DocumentId,
        content: &str,
    ) -> Result<DocumentVersion> {
        let response = self
            .http_client
            .post(self.versions_url(document_id))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(
                response.status(),
                &format!("create version for document {}", document_id),
            ));
        }

        let version: DocumentVersion = response.json().await?;
        log::info!(
            "Created version {} ({}) for document {}",
            version.version_number,
            version.id,
            document_id
        );
        Ok(version)
    }

    async fn create_file_version(
        &self,
        document_id: &DocumentId,
        filename: &str,
        bytes: Vec<u8>,
        notes: Option<&str>,
    ) -> Result<DocumentVersion> {
        let file_part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")?;

        let mut form = multipart::Form::new().part("file", file_part);
        if let Some(notes) = notes {
            form = form.text("notes", notes.to_string());
        }

        let response = self
            .http_client
            .post(format!("{}/file", self.versions_url(document_id)))
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(
                response.status(),
                &format!("upload version for document {}", document_id),
            ));
        }

        let version: DocumentVersion = response.json().await?;
        log::info!(
            "Uploaded version {} ({}) for document {}",
            version.version_number,
            version.id,
            document_id
        );
        Ok(version)
    }

    async fn fetch_version_content(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<VersionPayload> {
        let response = self
            .http_client
            .get(format!(
                "{}/{}/content",
                self.versions_url(document_id),
                version_id
            ))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(
                response.status(),
                &format!("version {} of document {}", version_id, document_id),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("application/json") {
            let value: serde_json::Value = response.json().await?;
            return Ok(match value {
                serde_json::Value::String(text) => VersionPayload::Text(text),
                other => VersionPayload::Unstructured(other),
            });
        }

        if content_type.starts_with("text/") {
            return Ok(VersionPayload::Text(response.text().await?));
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::filename_from_disposition)
            .unwrap_or_else(|| version_id.to_string());

        let bytes = response.bytes().await?.to_vec();
        Ok(VersionPayload::Binary { bytes, filename })
    }

    async fn download_version(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<(Vec<u8>, String)> {
        let response = self
            .http_client
            .get(format!(
                "{}/{}/download",
                self.versions_url(document_id),
                version_id
            ))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(
                response.status(),
                &format!("download of version {} of document {}", version_id, document_id),
            ));
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::filename_from_disposition)
            .unwrap_or_else(|| version_id.to_string());

        let bytes = response.bytes().await?.to_vec();
        log::debug!(
            "Downloaded {} bytes for version {} of document {}",
            bytes.len(),
            version_id,
            document_id
        );
        Ok((bytes, filename))
    }

    async fn list_workflows(&self, document_id: &DocumentId) -> Result<Vec<DocumentWorkflow>> {
        let response = self
            .http_client
            .get(self.workflows_url(document_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(
                response.status(),
                &format!("workflows of document {}", document_id),
            ));
        }

        let workflows: Vec<DocumentWorkflow> = response.json().await?;
        Ok(workflows)
    }

    async fn submit_workflow_action(
        &self,
        document_id: &DocumentId,
        workflow_id: &WorkflowId,
        submission: &ActionSubmission,
    ) -> Result<DocumentWorkflow> {
        let response = self
            .http_client
            .post(format!(
                "{}/{}/actions",
                self.workflows_url(document_id),
                workflow_id
            ))
            .header("Authorization", self.auth_header())
            .json(submission)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(
                response.status(),
                &format!("action on workflow {} of document {}", workflow_id, document_id),
            ));
        }

        let workflow: DocumentWorkflow = response.json().await?;
        log::info!(
            "Submitted {} on step {} of workflow {} (document {})",
            submission.action,
            submission.step_number,
            workflow_id,
            document_id
        );
        Ok(workflow)
    }
}
