//! Single-flight token refresh coordinator
//!
//! Owns the refresh lifecycle state the interceptors share. At most one
//! refresh network call is in flight per process; every 401 that lands
//! during that window awaits the same shared future and resumes, in
//! enqueue order, once it settles. On success the new token is written
//! to the token store before any waiter resumes; on failure the store
//! is wiped and the session-expired signal fires so the application can
//! navigate back to login.

use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::errors::ApiError;
use crate::refresh::RefreshClient;
use crate::store::TokenStore;

type SharedRefresh = Shared<BoxFuture<'static, Result<String, ApiError>>>;

/// Coordinates token refresh across concurrent requests.
pub struct RefreshCoordinator {
    refresh_client: Arc<RefreshClient>,
    tokens: TokenStore,
    in_flight: Mutex<Option<SharedRefresh>>,
    expired_tx: watch::Sender<bool>,
}

impl RefreshCoordinator {
    /// Create a coordinator around a refresh client and token store.
    #[must_use]
    pub fn new(refresh_client: Arc<RefreshClient>, tokens: TokenStore) -> Self {
        let (expired_tx, _) = watch::channel(false);
        Self { refresh_client, tokens, in_flight: Mutex::new(None), expired_tx }
    }

    /// Subscribe to the session-expired signal.
    ///
    /// Flips to `true` when a refresh fails irrecoverably; the
    /// application is expected to navigate to its login entry point.
    #[must_use]
    pub fn session_expired(&self) -> watch::Receiver<bool> {
        self.expired_tx.subscribe()
    }

    /// Obtain a fresh access token, joining any refresh already in
    /// flight instead of issuing a second network call.
    ///
    /// # Errors
    /// Returns `ApiError::RefreshFailed` when the refresh endpoint
    /// rejects the session; the token store is cleared first.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let shared = {
            let mut slot = self.in_flight.lock().await;
            if let Some(existing) = slot.as_ref() {
                debug!("joining in-flight token refresh");
                existing.clone()
            } else {
                let fut = Self::run_refresh(
                    self.refresh_client.clone(),
                    self.tokens.clone(),
                    self.expired_tx.clone(),
                )
                .boxed()
                .shared();
                *slot = Some(fut.clone());
                fut
            }
        };

        let result = shared.clone().await;

        // Retire the slot exactly once; a later refresh may already
        // have replaced it.
        let mut slot = self.in_flight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&shared)) {
            *slot = None;
        }

        result
    }

    async fn run_refresh(
        refresh_client: Arc<RefreshClient>,
        tokens: TokenStore,
        expired_tx: watch::Sender<bool>,
    ) -> Result<String, ApiError> {
        match refresh_client.refresh_access_token().await {
            Ok(token) => {
                // Persist before waiters resume so every replay sees
                // the new bearer value.
                tokens.set_access_token(&token);
                info!("access token refreshed");
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, ending session");
                tokens.clear();
                let _ = expired_tx.send(true);
                Err(ApiError::RefreshFailed(err.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator").finish_non_exhaustive()
    }
}
