//! Error taxonomy of the engine.
//!
//! Structural and interaction problems never surface here: the graph model
//! prunes or ignores them. Only persistence and dispatch report errors.

use std::path::PathBuf;

/// Failure to prepare or perform an execution call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Workflow must have a terminating component (End)")]
    MissingTerminator,

    #[error("Workflow is empty")]
    EmptyGraph,

    #[error("Cannot build '{pattern}' request: {detail}")]
    Extraction { pattern: String, detail: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Backend(String),

    #[error("Cannot read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A workflow is already running")]
    Busy,
}

impl DispatchError {
    pub(crate) fn extraction(pattern: &str, detail: impl Into<String>) -> Self {
        DispatchError::Extraction {
            pattern: pattern.to_string(),
            detail: detail.into(),
        }
    }
}

/// Failure to read or write a saved graph.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Graph file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed graph document: {0}")]
    Json(#[from] serde_json::Error),
}
