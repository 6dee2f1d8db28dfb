//! Client configuration
//!
//! Base URL resolution mirrors the deployment setup: an explicit
//! environment override wins, dev mode selects the empty (same-origin,
//! proxied) base, and production falls back to the fixed origin.

use std::time::Duration;

use moodloop_domain::constants::{
    endpoints, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, ENV_API_BASE_URL, ENV_DEV_MODE,
};

/// Configuration for the API client stack.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL prefixed to every path (may be empty in dev mode).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Resolve configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = match std::env::var(ENV_API_BASE_URL) {
            Ok(value) if !value.is_empty() => value,
            _ if std::env::var_os(ENV_DEV_MODE).is_some() => String::new(),
            _ => DEFAULT_API_BASE_URL.to_string(),
        };

        Self { base_url, ..Self::default() }
    }

    /// Configuration pointed at an explicit origin (used by tests and
    /// self-hosted deployments).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL of the token refresh endpoint.
    #[must_use]
    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.base_url, endpoints::AUTH_REFRESH)
    }
}
