//! Per-session token and user storage
//!
//! [`SessionStore`] abstracts the underlying key/value store (the
//! browsing-session analogue: values live for the process lifetime and
//! vanish with it). [`TokenStore`] layers the token/user contract on
//! top and is deliberately infallible: a broken store degrades to
//! "no value" on read and a logged no-op on write, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use moodloop_domain::constants::storage_keys;
use moodloop_domain::User;
use parking_lot::RwLock;
use tracing::warn;

/// String key/value store scoped to the current session.
///
/// Implementations must be cheap to call from synchronous code; all
/// operations are best-effort from the caller's point of view because
/// [`TokenStore`] swallows and logs every error.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    /// Returns a description of the underlying storage failure.
    fn get(&self, key: &str) -> Result<Option<String>, String>;

    /// Write a value.
    ///
    /// # Errors
    /// Returns a description of the underlying storage failure.
    fn set(&self, key: &str, value: &str) -> Result<(), String>;

    /// Remove a value.
    ///
    /// # Errors
    /// Returns a description of the underlying storage failure.
    fn remove(&self, key: &str) -> Result<(), String>;

    /// Remove every value.
    ///
    /// # Errors
    /// Returns a description of the underlying storage failure.
    fn clear(&self) -> Result<(), String>;
}

/// Process-lifetime session store backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.values.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), String> {
        self.values.write().clear();
        Ok(())
    }
}

/// Token and user storage facade over a [`SessionStore`].
///
/// Values are JSON-serialized. Reads tolerate quoting artifacts left
/// behind by earlier storage formats (a token stored as `"abc"` is
/// returned as `abc`).
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn SessionStore>,
}

impl TokenStore {
    /// Wrap a session store.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Current access token, if any. Stray quotes are stripped.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get_value(storage_keys::ACCESS_TOKEN).map(|raw| {
            raw.trim().trim_matches('"').to_string()
        })
    }

    /// Persist a new access token.
    pub fn set_access_token(&self, token: &str) {
        match serde_json::to_string(token) {
            Ok(serialized) => self.set_value(storage_keys::ACCESS_TOKEN, &serialized),
            Err(err) => warn!(error = %err, "failed to serialize access token"),
        }
    }

    /// Cached user object, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let raw = self.get_value(storage_keys::USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "stored user is not valid JSON, treating as missing");
                None
            }
        }
    }

    /// Mirror the user object into storage.
    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(serialized) => self.set_value(storage_keys::USER, &serialized),
            Err(err) => warn!(error = %err, "failed to serialize user"),
        }
    }

    /// Raw read with storage failures degraded to `None`.
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "session storage read failed");
                None
            }
        }
    }

    /// Raw write with storage failures degraded to a logged no-op.
    pub fn set_value(&self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            warn!(key = %key, error = %err, "session storage write failed");
        }
    }

    /// Raw removal with storage failures degraded to a logged no-op.
    pub fn remove_value(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            warn!(key = %key, error = %err, "session storage removal failed");
        }
    }

    /// Erase everything (token, user, bootstrap keys).
    pub fn clear(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "session storage clear failed");
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store that fails every operation, for degradation tests.
    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, String> {
            Err("quota exceeded".to_string())
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), String> {
            Err("quota exceeded".to_string())
        }
        fn remove(&self, _key: &str) -> Result<(), String> {
            Err("quota exceeded".to_string())
        }
        fn clear(&self) -> Result<(), String> {
            Err("quota exceeded".to_string())
        }
    }

    fn sample_user() -> User {
        User {
            id: "u1".to_string(),
            username: "mika".to_string(),
            name: "Mika".to_string(),
            email: Some("mika@example.com".to_string()),
            avatar: "https://cdn.moodloop.app/a/u1.png".to_string(),
            provider: "google".to_string(),
        }
    }

    #[test]
    fn token_round_trip_strips_json_quoting() {
        let store = TokenStore::new(Arc::new(InMemorySessionStore::new()));

        store.set_access_token("abc123");
        assert_eq!(store.access_token().as_deref(), Some("abc123"));
    }

    #[test]
    fn legacy_quoted_token_is_stripped_on_read() {
        let backing = Arc::new(InMemorySessionStore::new());
        backing.set(storage_keys::ACCESS_TOKEN, "\"legacy-token\"").unwrap();

        let store = TokenStore::new(backing);
        assert_eq!(store.access_token().as_deref(), Some("legacy-token"));
    }

    #[test]
    fn user_round_trips() {
        let store = TokenStore::new(Arc::new(InMemorySessionStore::new()));
        let user = sample_user();

        store.set_user(&user);
        assert_eq!(store.user(), Some(user));
    }

    #[test]
    fn clear_erases_token_and_user() {
        let store = TokenStore::new(Arc::new(InMemorySessionStore::new()));
        store.set_access_token("abc");
        store.set_user(&sample_user());

        store.clear();

        assert_eq!(store.access_token(), None);
        assert_eq!(store.user(), None);
    }

    #[test]
    fn broken_store_degrades_without_panicking() {
        let store = TokenStore::new(Arc::new(BrokenStore));

        store.set_access_token("abc");
        store.set_user(&sample_user());
        store.clear();

        assert_eq!(store.access_token(), None);
        assert_eq!(store.user(), None);
    }

    #[test]
    fn corrupt_user_json_reads_as_missing() {
        let backing = Arc::new(InMemorySessionStore::new());
        backing.set(storage_keys::USER, "{not json").unwrap();

        let store = TokenStore::new(backing);
        assert_eq!(store.user(), None);
    }
}
