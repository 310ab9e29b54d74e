//! Error types for AppDb client operations.

use thiserror::Error;

/// Errors surfaced by the document, collection and permission clients.
///
/// Nothing is retried or swallowed: every failure reaches the immediate caller.
#[derive(Error, Debug)]
pub enum AppDbError {
    /// A required argument was missing or empty; no request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The store answered 404 for the addressed document or collection.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status, or a network-level failure (`status` is `None`).
    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Operation intentionally left unimplemented.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppDbError {
    pub(crate) fn missing_document_id() -> Self {
        AppDbError::Validation("missing documentId".to_string())
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppDbError::NotFound(_) => Some(404),
            AppDbError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppDbError {
    fn from(e: reqwest::Error) -> Self {
        AppDbError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, AppDbError>;
