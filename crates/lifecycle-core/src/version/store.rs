//! Append-only version store with per-document navigation state
//!
//! Holds the cached newest-first version list and the selection pointer for
//! each document session. The selection pointer is what the navigation
//! buttons move; it is distinct from "latest".

use crate::clients::DocumentService;
use crate::error::{LifecycleError, Result};
use lifecycle_types::{DocumentId, DocumentVersion, VersionId, VersionPayload};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Navigation direction through the version list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward lower version numbers
    Prev,
    /// Toward higher version numbers
    Next,
}

/// File payload attached to a new version
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Input for creating a new version
#[derive(Debug, Clone, Default)]
pub struct NewVersion {
    pub content: Option<String>,
    pub file: Option<FileUpload>,
    pub notes: Option<String>,
}

impl NewVersion {
    pub fn note<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn file<S: Into<String>>(filename: S, bytes: Vec<u8>, notes: Option<String>) -> Self {
        Self {
            content: None,
            file: Some(FileUpload {
                filename: filename.into(),
                bytes,
            }),
            notes,
        }
    }

    /// True when nothing non-empty was submitted
    pub fn is_empty(&self) -> bool {
        let no_content = self.content.as_deref().map_or(true, |c| c.trim().is_empty());
        let no_notes = self.notes.as_deref().map_or(true, |n| n.trim().is_empty());
        no_content && no_notes && self.file.is_none()
    }
}

/// Cached per-document state: version list plus selection pointer
#[derive(Debug, Default)]
struct DocumentSession {
    /// Newest first (highest `version_number` at index 0)
    versions: Vec<DocumentVersion>,
    selected: Option<VersionId>,
}

/// Stateful service managing the append-only version history per document
pub struct VersionStore {
    service: Arc<dyn DocumentService>,
    sessions: Mutex<HashMap<DocumentId, DocumentSession>>,
    // One lock per document so concurrent creates never race the sequence
    create_locks: std::sync::Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>,
}

impl VersionStore {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self {
            service,
            sessions: Mutex::new(HashMap::new()),
            create_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn create_lock(&self, document_id: &DocumentId) -> Arc<Mutex<()>> {
        let mut locks = self
            .create_locks
            .lock()
            .expect("version store lock map poisoned");
        locks
            .entry(document_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Re-fetch the version list from the service and update the cache
    async fn refresh(&self, document_id: &DocumentId) -> Result<Vec<DocumentVersion>> {
        let versions = self.service.list_versions(document_id).await?;
        log::debug!(
            "Refreshed {} versions for document {}",
            versions.len(),
            document_id
        );

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(document_id.clone()).or_default();
        session.versions = versions.clone();

        // Drop a selection that no longer resolves
        if let Some(selected) = &session.selected {
            if !session.versions.iter().any(|v| &v.id == selected) {
                session.selected = None;
            }
        }

        Ok(versions)
    }

    async fn cached_or_refresh(&self, document_id: &DocumentId) -> Result<Vec<DocumentVersion>> {
        {
            let sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get(document_id) {
                if !session.versions.is_empty() {
                    return Ok(session.versions.clone());
                }
            }
        }
        self.refresh(document_id).await
    }

    /// List all versions of a document, newest first
    pub async fn list_versions(&self, document_id: &DocumentId) -> Result<Vec<DocumentVersion>> {
        self.refresh(document_id).await
    }

    /// Create a new version; serialized per document
    ///
    /// At least one of content/file/notes must be non-empty. The new
    /// version's number must extend the sequence (max existing + 1); the
    /// per-document lock keeps two near-simultaneous submissions from
    /// racing the sequence.
    pub async fn create_version(
        &self,
        document_id: &DocumentId,
        new_version: NewVersion,
    ) -> Result<DocumentVersion> {
        if new_version.is_empty() {
            return Err(LifecycleError::Validation(
                "Version submission is empty: provide content, a file, or notes".to_string(),
            ));
        }

        let lock = self.create_lock(document_id);
        let _guard = lock.lock().await;

        let previous_max = self
            .refresh(document_id)
            .await?
            .first()
            .map(|v| v.version_number)
            .unwrap_or(0);

        let created = match new_version.file {
            Some(file) => {
                self.service
                    .create_file_version(
                        document_id,
                        &file.filename,
                        file.bytes,
                        new_version.notes.as_deref(),
                    )
                    .await?
            }
            None => {
                // Notes-only submissions travel as the version content
                let content = new_version
                    .content
                    .or(new_version.notes)
                    .unwrap_or_default();
                self.service
                    .create_note_version(document_id, &content)
                    .await?
            }
        };

        if created.version_number <= previous_max {
            log::warn!(
                "Version sequence anomaly for document {}: created {} but cache max was {}",
                document_id,
                created.version_number,
                previous_max
            );
        }

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(document_id.clone()).or_default();
        session.versions.insert(0, created.clone());
        session
            .versions
            .sort_by(|a, b| b.version_number.cmp(&a.version_number));
        session.selected = Some(created.id.clone());

        log::info!(
            "Created version {} for document {}",
            created.version_number,
            document_id
        );
        Ok(created)
    }

    /// Select a version as the navigation position
    pub async fn select_version(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<DocumentVersion> {
        let versions = self.cached_or_refresh(document_id).await?;
        let version = versions
            .iter()
            .find(|v| &v.id == version_id)
            .cloned()
            .ok_or_else(|| {
                LifecycleError::NotFound(format!(
                    "version {} of document {}",
                    version_id, document_id
                ))
            })?;

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(document_id.clone()).or_default();
        session.selected = Some(version.id.clone());
        Ok(version)
    }

    /// Step the selection toward older (`Prev`) or newer (`Next`) versions
    ///
    /// Navigating past either end is a no-op: the version at the boundary
    /// comes back unchanged, not an error.
    pub async fn navigate(
        &self,
        document_id: &DocumentId,
        direction: Direction,
        from_version_id: &VersionId,
    ) -> Result<DocumentVersion> {
        let versions = self.cached_or_refresh(document_id).await?;
        let index = versions
            .iter()
            .position(|v| &v.id == from_version_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!(
                    "version {} of document {}",
                    from_version_id, document_id
                ))
            })?;

        // Newest first: Prev (older) moves down the list, Next (newer) up
        let target = match direction {
            Direction::Prev if index + 1 < versions.len() => index + 1,
            Direction::Next if index > 0 => index - 1,
            _ => index,
        };

        let version = versions[target].clone();
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(document_id.clone()).or_default();
        session.selected = Some(version.id.clone());
        Ok(version)
    }

    /// The version the navigation pointer currently references
    ///
    /// Falls back to the latest version when nothing was explicitly
    /// selected yet.
    pub async fn current_selection(&self, document_id: &DocumentId) -> Option<DocumentVersion> {
        let sessions = self.sessions.lock().await;
        let session = sessions.get(document_id)?;
        match &session.selected {
            Some(id) => session.versions.iter().find(|v| &v.id == id).cloned(),
            None => session.versions.first().cloned(),
        }
    }

    /// Fetch the text or binary payload of one version
    pub async fn fetch_version_payload(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<VersionPayload> {
        let version = self.locate(document_id, version_id).await?;

        if !version.has_payload() {
            return Err(LifecycleError::NotFound(format!(
                "version {} of document {} has no retrievable payload",
                version_id, document_id
            )));
        }

        // Inline notes need no round trip
        if let Some(content) = version.content.filter(|c| !c.is_empty()) {
            return Ok(VersionPayload::Text(content));
        }

        self.service
            .fetch_version_content(document_id, version_id)
            .await
    }

    /// Download a version's binary payload plus a suggested filename
    pub async fn download_version(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<(Vec<u8>, String)> {
        let version = self.locate(document_id, version_id).await?;
        let file_reference = version.file_reference.ok_or_else(|| {
            LifecycleError::NotFound(format!(
                "version {} of document {} has no downloadable file",
                version_id, document_id
            ))
        })?;

        let (bytes, filename) = self
            .service
            .download_version(document_id, version_id)
            .await?;

        let filename = if filename.is_empty() {
            file_reference.filename
        } else {
            filename
        };
        Ok((bytes, filename))
    }

    async fn locate(
        &self,
        document_id: &DocumentId,
        version_id: &VersionId,
    ) -> Result<DocumentVersion> {
        let versions = self.cached_or_refresh(document_id).await?;
        versions
            .into_iter()
            .find(|v| &v.id == version_id)
            .ok_or_else(|| {
                LifecycleError::NotFound(format!(
                    "version {} of document {}",
                    version_id, document_id
                ))
            })
    }
}
