//! Typed endpoint wrappers
//!
//! One small API type per backend surface, layered on [`ApiClient`]:
//! wrappers own the request paths, unwrap the response envelope, and
//! apply the cross-cutting read policies (de-duplication for hot reads,
//! optimistic state for likes). The HTTP layer below stays envelope-
//! agnostic.

pub mod auth;
pub mod comments;
pub mod posts;
pub mod recommend;
pub mod users;

pub use auth::AuthApi;
pub use comments::CommentsApi;
pub use posts::PostsApi;
pub use recommend::RecommendApi;
pub use users::UsersApi;

use moodloop_domain::ApiEnvelope;

use crate::errors::ApiError;

/// Unwrap a response envelope into its payload.
///
/// # Errors
/// Returns `ApiError::Client` when the envelope reports failure or
/// carries no data.
pub(crate) fn unwrap_data<T>(envelope: ApiEnvelope<T>) -> Result<T, ApiError> {
    if !envelope.success {
        return Err(ApiError::Client(format!(
            "request rejected by service: {} (code {})",
            envelope.message, envelope.code
        )));
    }
    envelope
        .data
        .ok_or_else(|| ApiError::Client("response envelope carried no data".to_string()))
}

/// Check an envelope for operations whose payload is irrelevant.
///
/// # Errors
/// Returns `ApiError::Client` when the envelope reports failure.
pub(crate) fn expect_success(envelope: ApiEnvelope<serde_json::Value>) -> Result<(), ApiError> {
    if !envelope.success {
        return Err(ApiError::Client(format!(
            "request rejected by service: {} (code {})",
            envelope.message, envelope.code
        )));
    }
    Ok(())
}
