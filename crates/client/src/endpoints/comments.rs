//! Comment threads
//!
//! Fetches nested comment trees and exposes them either raw or
//! flattened into display rows via the domain traversal.

use std::sync::Arc;

use moodloop_domain::constants::endpoints;
use moodloop_domain::{flatten_thread, ApiEnvelope, Comment, CommentRow, NewComment};
use urlencoding::encode;

use super::{expect_success, unwrap_data};
use crate::api::ApiClient;
use crate::errors::ApiError;

/// Comments surface of the API.
pub struct CommentsApi {
    client: Arc<ApiClient>,
}

impl CommentsApi {
    /// Create the wrapper.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Fetch the nested comment tree for a post.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn list(&self, post_id: &str) -> Result<Vec<Comment>, ApiError> {
        let url = format!("{}?postId={}", endpoints::COMMENTS, encode(post_id));
        let envelope: ApiEnvelope<Vec<Comment>> = self.client.get(&url).await?;
        unwrap_data(envelope)
    }

    /// Fetch a post's comments flattened into display order.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn thread(&self, post_id: &str) -> Result<Vec<CommentRow>, ApiError> {
        let comments = self.list(post_id).await?;
        Ok(flatten_thread(&comments))
    }

    /// Post a comment (or a reply, when `parent_id` is set).
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn create(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        let envelope: ApiEnvelope<Comment> = self.client.post(endpoints::COMMENTS, comment).await?;
        unwrap_data(envelope)
    }

    /// Delete a comment.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn delete(&self, comment_id: &str) -> Result<(), ApiError> {
        let envelope: ApiEnvelope<serde_json::Value> =
            self.client.delete(&format!("{}/{comment_id}", endpoints::COMMENTS)).await?;
        expect_success(envelope)
    }
}
