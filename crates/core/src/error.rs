//! Error types for the piste domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Remote completion failures collapse into a single kind,
//! [`RemoteUnavailable`], so callers have exactly one branch for fallback.

use thiserror::Error;

/// The top-level error type for piste operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Remote completion ---
    #[error("Remote completion unavailable: {0}")]
    Remote(#[from] RemoteUnavailable),

    // --- Client errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is the caller's fault (maps to HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

/// Every way a remote completion can fail.
///
/// The variants only exist so logs can tell a timeout from an HTTP error
/// from an empty body; callers treat them all the same.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteUnavailable {
    #[error("remote client not configured: {0}")]
    NotConfigured(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("endpoint returned HTTP {status_code}: {message}")]
    Http { status_code: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("endpoint returned an empty completion")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteUnavailable {
    /// Short machine-readable reason, used as a tracing field.
    pub fn reason(&self) -> &'static str {
        match self {
            RemoteUnavailable::NotConfigured(_) => "not_configured",
            RemoteUnavailable::Timeout { .. } => "timeout",
            RemoteUnavailable::Http { .. } => "http_error",
            RemoteUnavailable::Network(_) => "network",
            RemoteUnavailable::EmptyResponse => "empty_response",
            RemoteUnavailable::Malformed(_) => "malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_status() {
        let err = Error::Remote(RemoteUnavailable::Http {
            status_code: 500,
            message: "upstream exploded".into(),
        });
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn reasons_are_distinct() {
        let reasons = [
            RemoteUnavailable::NotConfigured("no key".into()).reason(),
            RemoteUnavailable::Timeout { timeout_secs: 30 }.reason(),
            RemoteUnavailable::Http {
                status_code: 502,
                message: String::new(),
            }
            .reason(),
            RemoteUnavailable::Network("refused".into()).reason(),
            RemoteUnavailable::EmptyResponse.reason(),
            RemoteUnavailable::Malformed("eof".into()).reason(),
        ];
        let unique: std::collections::HashSet<_> = reasons.iter().collect();
        assert_eq!(unique.len(), reasons.len());
    }

    #[test]
    fn only_invalid_input_is_a_client_error() {
        assert!(Error::InvalidInput("message is required".into()).is_client_error());
        assert!(!Error::Remote(RemoteUnavailable::EmptyResponse).is_client_error());
        assert!(!Error::Internal("boom".into()).is_client_error());
    }
}
