//! Posts CRUD and like toggling
//!
//! Likes use the optimistic helper: the flipped state is visible to
//! readers the moment the toggle starts, the server's answer replaces
//! it on success, and the previous state returns on failure.

use std::sync::Arc;

use moodloop_common::OptimisticMap;
use moodloop_domain::constants::endpoints;
use moodloop_domain::{ApiEnvelope, LikeState, NewPost, Post};

use super::{expect_success, unwrap_data};
use crate::api::ApiClient;
use crate::errors::ApiError;

/// Posts surface of the API.
pub struct PostsApi {
    client: Arc<ApiClient>,
    likes: OptimisticMap<LikeState>,
}

impl PostsApi {
    /// Create the wrapper.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, likes: OptimisticMap::new() }
    }

    /// Fetch the feed. Each post's like state is seeded into the local
    /// map so toggles start from server truth.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn list(&self) -> Result<Vec<Post>, ApiError> {
        let envelope: ApiEnvelope<Vec<Post>> = self.client.get(endpoints::POSTS).await?;
        let posts = unwrap_data(envelope)?;

        for post in &posts {
            self.likes.set(
                &post.id,
                LikeState { liked: post.liked_by_me, like_count: post.like_count },
            );
        }
        Ok(posts)
    }

    /// Fetch a single post.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn get(&self, post_id: &str) -> Result<Post, ApiError> {
        let envelope: ApiEnvelope<Post> =
            self.client.get(&format!("{}/{post_id}", endpoints::POSTS)).await?;
        let post = unwrap_data(envelope)?;

        self.likes.set(
            &post.id,
            LikeState { liked: post.liked_by_me, like_count: post.like_count },
        );
        Ok(post)
    }

    /// Publish a post.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn create(&self, draft: &NewPost) -> Result<Post, ApiError> {
        let envelope: ApiEnvelope<Post> = self.client.post(endpoints::POSTS, draft).await?;
        unwrap_data(envelope)
    }

    /// Delete a post.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn delete(&self, post_id: &str) -> Result<(), ApiError> {
        let envelope: ApiEnvelope<serde_json::Value> =
            self.client.delete(&format!("{}/{post_id}", endpoints::POSTS)).await?;
        expect_success(envelope)?;
        self.likes.remove(post_id);
        Ok(())
    }

    /// Locally visible like state for a post, if known.
    #[must_use]
    pub fn like_state(&self, post_id: &str) -> Option<LikeState> {
        self.likes.get(post_id)
    }

    /// Toggle the like on a post optimistically.
    ///
    /// Readers of [`Self::like_state`] see the flipped state for the
    /// whole round trip; the server's state wins on success and the
    /// previous state is restored on failure.
    ///
    /// # Errors
    /// Propagates request and envelope errors after rolling back.
    pub async fn toggle_like(&self, post_id: &str) -> Result<LikeState, ApiError> {
        let current = self.likes.get(post_id).unwrap_or(LikeState { liked: false, like_count: 0 });
        let optimistic = LikeState {
            liked: !current.liked,
            like_count: if current.liked {
                current.like_count.saturating_sub(1)
            } else {
                current.like_count + 1
            },
        };

        let client = self.client.clone();
        let url = format!("{}/{post_id}/like", endpoints::POSTS);
        self.likes
            .update(post_id, optimistic, move || async move {
                let envelope: ApiEnvelope<LikeState> =
                    client.post(&url, &serde_json::json!({})).await?;
                unwrap_data(envelope)
            })
            .await
    }
}
