//! Error types for video generation.

use std::path::PathBuf;
use std::time::Duration;

/// Maximum length of a remote error body kept in an error message.
const MAX_ERROR_BODY_LEN: usize = 2048;

/// Errors that can occur while building, submitting or resolving a job.
#[derive(Debug, thiserror::Error)]
pub enum VeoGenError {
    /// Credential missing or rejected.
    #[error("credential error: {0}")]
    Credential(String),

    /// An input image could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    FileAccess {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The service rejected the generation request. Never retried.
    #[error("submission rejected: {status} - {message}")]
    Submission {
        /// HTTP status of the rejection.
        status: u16,
        /// Response body, verbatim.
        message: String,
    },

    /// The operation finished without any result items.
    #[error("no videos generated")]
    NoResults,

    /// API returned an error response outside of submission.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the service.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait, from the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// Polling exceeded the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The operation finished with an error payload.
    #[error("video generation failed: {0}")]
    Generation(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VeoGenError {
    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Network(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

/// Result type alias for video generation operations.
pub type Result<T> = std::result::Result<T, VeoGenError>;

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Trims a remote error body to something printable.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let text = text.trim();
    if text.len() <= MAX_ERROR_BODY_LEN {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
