//! Auth status and logout
//!
//! The status probe is the hottest read in the app (every protected
//! view asks it on mount), so it goes through the de-duplication cache
//! under a fixed key.

use std::sync::Arc;

use moodloop_common::RequestCache;
use moodloop_domain::constants::endpoints;
use moodloop_domain::{ApiEnvelope, AuthStatus};
use tracing::debug;

use super::{expect_success, unwrap_data};
use crate::api::ApiClient;
use crate::errors::ApiError;

const STATUS_KEY: &str = "auth-status";

/// Auth surface of the API.
pub struct AuthApi {
    client: Arc<ApiClient>,
    status_cache: RequestCache<AuthStatus, ApiError>,
}

impl AuthApi {
    /// Create the wrapper.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, status_cache: RequestCache::new() }
    }

    /// Whether the current session is authenticated.
    ///
    /// Concurrent and shortly repeated probes collapse into a single
    /// network call.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn status(&self) -> Result<AuthStatus, ApiError> {
        let client = self.client.clone();
        self.status_cache
            .execute(STATUS_KEY, move || async move {
                let envelope: ApiEnvelope<AuthStatus> = client.get(endpoints::AUTH_STATUS).await?;
                unwrap_data(envelope)
            })
            .await
    }

    /// End the server-side session.
    ///
    /// The cached status probe is invalidated so the next check hits
    /// the network.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let envelope: ApiEnvelope<serde_json::Value> =
            self.client.post(endpoints::AUTH_LOGOUT, &serde_json::json!({})).await?;
        expect_success(envelope)?;

        self.status_cache.invalidate(STATUS_KEY);
        debug!("server session terminated");
        Ok(())
    }
}
