//! Unauthenticated token refresh client
//!
//! Talks only to the refresh endpoint on a dedicated `reqwest::Client`.
//! The refresh credential travels as an HTTP-only cookie managed by the
//! client's cookie store, never as a bearer header, and this client is
//! structurally separate from [`crate::api::ApiClient`] so the refresh
//! call can never re-enter the 401 handling that triggered it.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::errors::ApiError;

/// Wire shape of a successful refresh response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// Bare HTTP client for the token refresh endpoint.
pub struct RefreshClient {
    http: reqwest::Client,
    refresh_url: String,
}

impl RefreshClient {
    /// Build a refresh client for the configured origin.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the underlying client cannot be
    /// constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .build()
            .map_err(|err| ApiError::Config(format!("failed to build refresh client: {err}")))?;

        Ok(Self { http, refresh_url: config.refresh_url() })
    }

    /// Request a new access token.
    ///
    /// No retry at this layer: a failure here means the session cannot
    /// be recovered and is handled by the caller.
    ///
    /// # Errors
    /// Propagates transport errors and non-2xx responses.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        debug!(url = %self.refresh_url, "requesting new access token");

        let response = self.http.post(&self.refresh_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &self.refresh_url, &body));
        }

        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|err| ApiError::Client(format!("failed to parse refresh response: {err}")))?;

        Ok(parsed.access_token)
    }
}
