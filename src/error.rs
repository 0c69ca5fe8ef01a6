//! Failure taxonomy for a single analysis invocation.

use reqwest::StatusCode;
use thiserror::Error;

/// Fixed user-facing message for an invocation that hit its deadline.
pub const TIMEOUT_MESSAGE: &str = "request took too long";

/// How much of a non-JSON body is shown to the user.
pub const RAW_PREVIEW_CHARS: usize = 400;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("request took too long")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("Malformed response from server (status {status}): {preview}")]
    MalformedResponse {
        status: StatusCode,
        preview: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{message}")]
    RemoteError { status: StatusCode, message: String },

    #[error("{0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn malformed(status: StatusCode, raw: &str, source: serde_json::Error) -> Self {
        AnalysisError::MalformedResponse {
            status,
            preview: truncate_chars(raw, RAW_PREVIEW_CHARS),
            source,
        }
    }

    /// Short name of the failure kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Timeout => "timeout",
            AnalysisError::Cancelled => "cancelled",
            AnalysisError::MalformedResponse { .. } => "malformed_response",
            AnalysisError::RemoteError { .. } => "remote_error",
            AnalysisError::Unexpected(_) => "unexpected",
        }
    }

    /// Message suitable for the status banner.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Generic banner text for a failed status when the payload carries no `error`.
pub fn status_message(status: StatusCode) -> String {
    format!("Request failed with status {status}")
}

/// Truncate to at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
