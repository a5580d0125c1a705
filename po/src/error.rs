//! Error types for template processing

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to callers of the library
///
/// Content-level problems (a failing function, an unsafe command) never show
/// up here; they are rendered inline. Only I/O and data-loading failures do.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Template file not found: {path}")]
    TemplateNotFound { path: PathBuf },

    #[error("Failed to read template file {path}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON file not found: {path}")]
    JsonNotFound { path: PathBuf },

    #[error("Failed to read {path}")]
    JsonRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write output to {path}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unresolved placeholders: {}", missing.join(", "))]
    Unresolved { missing: Vec<String> },
}
