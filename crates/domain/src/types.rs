//! Core domain data types
//!
//! Wire-facing structures use camelCase field names to match the
//! service's JSON contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A MoodLoop user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub avatar: String,
    /// Login provider that issued this identity (e.g. "google", "kakao").
    pub provider: String,
}

/// A point on the 2D emotion chart.
///
/// `valence` is pleasantness (-1.0..=1.0), `energy` is arousal
/// (-1.0..=1.0). Both axes are clamped by the UI before reaching us.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodPoint {
    pub valence: f32,
    pub energy: f32,
}

/// A desired transition between two moods, driving recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodTransition {
    pub from: MoodPoint,
    pub to: MoodPoint,
}

/// A recommended or posted track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// A published playlist post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: User,
    pub title: String,
    pub description: String,
    pub mood: MoodTransition,
    pub tracks: Vec<Track>,
    pub tags: Vec<String>,
    pub like_count: u64,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
}

/// Standard response envelope returned by business endpoints.
///
/// The HTTP layer never unwraps this; callers read [`ApiEnvelope::data`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

/// Result of `GET /v1/auth/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
}

/// Like state for a post, as the server reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

/// Query for mood-transition track recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendQuery {
    pub mood: MoodTransition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Payload for publishing a new post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub mood: MoodTransition,
    pub tracks: Vec<Track>,
    pub tags: Vec<String>,
}

/// Payload for creating a comment. `parent_id` nests the comment as a
/// reply; `None` makes it top-level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Partial profile edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl RecommendQuery {
    /// Stable cache key for de-duplicating identical recommendation
    /// searches. Includes every query parameter so distinct searches
    /// never coalesce.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "recommend:{:.3}:{:.3}:{:.3}:{:.3}:{}",
            self.mood.from.valence,
            self.mood.from.energy,
            self.mood.to.valence,
            self.mood.to.energy,
            self.limit.unwrap_or(0),
        )
    }
}
