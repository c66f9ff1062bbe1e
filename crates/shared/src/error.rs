//! Shared error types for the processing API.

use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the processing API: `{"detail": "..."}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Attempt to pull a user-facing message out of an error body.
pub fn try_error_detail(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ErrorDetail>(body).ok()?;
    let detail = parsed.detail.trim();
    if detail.is_empty() {
        None
    } else {
        Some(detail.to_string())
    }
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl ApiError {
    /// Message suitable for showing to a user. Prefers the server's `detail`.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { body, .. } => {
                try_error_detail(body).unwrap_or_else(|| self.to_string())
            }
            other => other.to_string(),
        }
    }
}
