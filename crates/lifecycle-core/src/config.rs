//! Configuration management for the document lifecycle system

use crate::error::{LifecycleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    pub document_service: DocumentServiceConfig,

    /// Ordered review pipeline step names; index order is step order
    #[serde(default = "default_pipeline_names")]
    pub pipeline: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentServiceConfig {
    #[serde(alias = "url")] // Accept both 'base_url' and 'url'
    pub base_url: String,

    #[serde(alias = "token")] // Accept both 'api_token' and 'token'
    pub api_token: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Default functions
fn default_timeout_secs() -> u64 {
    30
}

fn default_pipeline_names() -> Vec<String> {
    vec![
        "Upload".to_string(),
        "Review".to_string(),
        "Approve".to_string(),
        "Finalize".to_string(),
    ]
}

impl LifecycleConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LifecycleError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LifecycleConfig = serde_json::from_str(json)
            .map_err(|e| LifecycleError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.document_service.base_url.is_empty() {
            return Err(LifecycleError::Config(
                "Document service base URL is required".to_string(),
            ));
        }

        if self.document_service.api_token.is_empty() {
            return Err(LifecycleError::Config(
                "Document service API token is required".to_string(),
            ));
        }

        if self.pipeline.is_empty() {
            return Err(LifecycleError::Config(
                "Review pipeline must have at least one step".to_string(),
            ));
        }

        Ok(())
    }
}
