//! User profiles

use std::sync::Arc;

use moodloop_domain::constants::endpoints;
use moodloop_domain::{ApiEnvelope, ProfileUpdate, User};

use super::unwrap_data;
use crate::api::ApiClient;
use crate::errors::ApiError;

/// Users surface of the API.
pub struct UsersApi {
    client: Arc<ApiClient>,
}

impl UsersApi {
    /// Create the wrapper.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Fetch the logged-in user's profile.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn me(&self) -> Result<User, ApiError> {
        let envelope: ApiEnvelope<User> =
            self.client.get(&format!("{}/me", endpoints::USERS)).await?;
        unwrap_data(envelope)
    }

    /// Fetch another user's public profile.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn get(&self, user_id: &str) -> Result<User, ApiError> {
        let envelope: ApiEnvelope<User> =
            self.client.get(&format!("{}/{user_id}", endpoints::USERS)).await?;
        unwrap_data(envelope)
    }

    /// Apply a partial profile edit; returns the updated profile.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let envelope: ApiEnvelope<User> =
            self.client.patch(&format!("{}/me", endpoints::USERS), update).await?;
        unwrap_data(envelope)
    }
}
