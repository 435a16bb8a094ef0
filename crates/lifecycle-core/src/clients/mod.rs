//! Client modules for external services

pub mod document_service;

// Re-export all client types
pub use document_service::{ActionSubmission, DocumentService, DocumentServiceClient};
