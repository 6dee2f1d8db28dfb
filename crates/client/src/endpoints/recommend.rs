//! Mood-transition recommendations and tag suggestions
//!
//! Both reads are driven by rapid UI input (chart drags, keystrokes),
//! so both go through the de-duplication cache. Recommendation keys
//! fold every query parameter; tag keys fold the prefix.

use std::sync::Arc;

use moodloop_common::RequestCache;
use moodloop_domain::constants::endpoints;
use moodloop_domain::{ApiEnvelope, RecommendQuery, Track};
use urlencoding::encode;

use super::unwrap_data;
use crate::api::ApiClient;
use crate::errors::ApiError;

/// Recommendation surface of the API.
pub struct RecommendApi {
    client: Arc<ApiClient>,
    track_cache: RequestCache<Vec<Track>, ApiError>,
    tag_cache: RequestCache<Vec<String>, ApiError>,
}

impl RecommendApi {
    /// Create the wrapper.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, track_cache: RequestCache::new(), tag_cache: RequestCache::new() }
    }

    /// Recommend tracks for a mood transition.
    ///
    /// Identical queries issued within the cache TTL share one network
    /// call; distinct queries never coalesce.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn recommend(&self, query: &RecommendQuery) -> Result<Vec<Track>, ApiError> {
        let client = self.client.clone();
        let body = query.clone();
        self.track_cache
            .execute(&query.cache_key(), move || async move {
                let envelope: ApiEnvelope<Vec<Track>> =
                    client.post(endpoints::RECOMMEND, &body).await?;
                unwrap_data(envelope)
            })
            .await
    }

    /// Suggest tags for a partial input.
    ///
    /// # Errors
    /// Propagates request and envelope errors.
    pub async fn suggest_tags(&self, prefix: &str) -> Result<Vec<String>, ApiError> {
        let client = self.client.clone();
        let url = format!("{}?q={}", endpoints::TAG_SUGGEST, encode(prefix));
        self.tag_cache
            .execute(&format!("tags:{prefix}"), move || async move {
                let envelope: ApiEnvelope<Vec<String>> = client.get(&url).await?;
                unwrap_data(envelope)
            })
            .await
    }

    /// Drop every cached recommendation and suggestion.
    pub fn invalidate(&self) {
        self.track_cache.invalidate_all();
        self.tag_cache.invalidate_all();
    }
}
