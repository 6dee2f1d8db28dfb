//! Optimistic update helper
//!
//! Three-phase keyed transaction over a local value map: snapshot the
//! current value, apply the optimistic value so readers see it
//! immediately, then commit the server's answer on success or roll
//! back to the snapshot on failure.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::RwLock;
use tracing::debug;

/// Keyed map of locally cached values supporting optimistic updates.
pub struct OptimisticMap<T>
where
    T: Clone,
{
    entries: RwLock<HashMap<String, T>>,
}

impl<T: Clone> Default for OptimisticMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> OptimisticMap<T> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Current value for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.read().get(key).cloned()
    }

    /// Replace the value for `key` outside a transaction (e.g. seeding
    /// from a fetch).
    pub fn set(&self, key: &str, value: T) {
        self.entries.write().insert(key.to_string(), value);
    }

    /// Remove the value for `key`.
    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Run a three-phase optimistic transaction on `key`.
    ///
    /// The optimistic value is visible to readers for the whole commit
    /// await. On success the committed (server) value replaces it; on
    /// failure the pre-transaction snapshot is restored (or the key is
    /// removed if it did not exist).
    ///
    /// # Errors
    /// Propagates the commit error after rolling back.
    pub async fn update<E, F, Fut>(&self, key: &str, optimistic: T, commit: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let snapshot = {
            let mut entries = self.entries.write();
            let snapshot = entries.get(key).cloned();
            entries.insert(key.to_string(), optimistic);
            snapshot
        };

        match commit().await {
            Ok(committed) => {
                self.entries.write().insert(key.to_string(), committed.clone());
                Ok(committed)
            }
            Err(err) => {
                debug!(key = %key, "commit failed, rolling back optimistic value");
                let mut entries = self.entries.write();
                match snapshot {
                    Some(previous) => {
                        entries.insert(key.to_string(), previous);
                    }
                    None => {
                        entries.remove(key);
                    }
                }
                Err(err)
            }
        }
    }
}
