//! API-specific error types
//!
//! Classifies HTTP and auth failures. Variants carry plain strings so
//! the type stays `Clone` and a shared refresh or de-duplicated request
//! can hand the same error to every waiter.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// API operation errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Request was rejected as unauthenticated after a replay, or the
    /// server denied access outright (401/403).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Token refresh itself failed; the session is over.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the request. Not an application failure:
    /// never triggers refresh and never counts as a failed attempt.
    #[error("Request aborted")]
    Aborted,
}

impl ApiError {
    /// Map a non-success HTTP status to an error variant.
    #[must_use]
    pub fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimit(message)
        } else if status.is_server_error() {
            Self::Server(message)
        } else if status.is_client_error() {
            Self::Client(message)
        } else {
            Self::Network(message)
        }
    }

    /// True for outcomes that represent cancellation rather than failure.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_taxonomy() {
        let url = "https://api.test/v1/post";
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, url, ""),
            ApiError::Auth(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, url, ""),
            ApiError::Auth(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, url, ""),
            ApiError::RateLimit(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, url, ""),
            ApiError::Server(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, url, ""),
            ApiError::Client(_)
        ));
    }

    #[test]
    fn status_message_includes_body_when_present() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "https://api.test/x", "bad tag");
        assert!(err.to_string().contains("bad tag"));
    }

    #[test]
    fn abort_is_distinguished() {
        assert!(ApiError::Aborted.is_abort());
        assert!(!ApiError::Auth("no".to_string()).is_abort());
    }
}
