//! Auth session state
//!
//! In-memory view of the logged-in user, hydrated once from the session
//! store at startup and kept in sync with it on every transition. The
//! store is the durable side; this service is the fast path callers
//! consult between transitions.

use moodloop_domain::constants::storage_keys;
use moodloop_domain::User;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::store::TokenStore;

/// Point-in-time view of the auth session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Whether a user is currently logged in.
    pub is_logged_in: bool,
    /// The logged-in user, when known.
    pub user: Option<User>,
    /// Identity provider used for the current login.
    pub login_provider: Option<String>,
    /// True until the first hydration completes.
    pub loading: bool,
}

/// Session lifecycle service bridging the token store and callers.
pub struct SessionService {
    tokens: TokenStore,
    state: RwLock<SessionSnapshot>,
}

impl SessionService {
    /// Create an un-hydrated service; `loading` stays `true` until
    /// [`Self::hydrate`] runs.
    #[must_use]
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            tokens,
            state: RwLock::new(SessionSnapshot { loading: true, ..SessionSnapshot::default() }),
        }
    }

    /// Rebuild the in-memory session from durable storage.
    ///
    /// Corrupt or partial persisted state resolves to logged-out and
    /// the offending keys are removed. Safe to call more than once;
    /// repeated hydrations of unchanged storage are no-ops.
    pub async fn hydrate(&self) {
        let flagged_logged_in = self
            .tokens
            .get_value(storage_keys::IS_LOGGED_IN)
            .is_some_and(|raw| raw == "true");

        let mut next = SessionSnapshot::default();

        if flagged_logged_in {
            match self.tokens.get_value(storage_keys::USER_DATA) {
                Some(raw) => match serde_json::from_str::<User>(&raw) {
                    Ok(user) => {
                        next.is_logged_in = true;
                        next.login_provider = self.tokens.get_value(storage_keys::LOGIN_PROVIDER);
                        next.user = Some(user);
                    }
                    Err(err) => {
                        warn!(error = %err, "persisted user data is corrupt, logging out");
                        self.discard_persisted_session();
                    }
                },
                None => {
                    debug!("logged-in flag set but no user data, logging out");
                    self.discard_persisted_session();
                }
            }
        }

        *self.state.write().await = next;
    }

    /// Record a successful login, durably first, then in memory.
    pub async fn login(&self, provider: &str, user: User) {
        match serde_json::to_string(&user) {
            Ok(serialized) => {
                self.tokens.set_value(storage_keys::IS_LOGGED_IN, "true");
                self.tokens.set_value(storage_keys::LOGIN_PROVIDER, provider);
                self.tokens.set_value(storage_keys::USER_DATA, &serialized);
                self.tokens.set_user(&user);
            }
            Err(err) => warn!(error = %err, "failed to serialize user for login"),
        }

        *self.state.write().await = SessionSnapshot {
            is_logged_in: true,
            user: Some(user),
            login_provider: Some(provider.to_string()),
            loading: false,
        };

        info!(provider = %provider, "session established");
    }

    /// End the session: wipe storage, then reset memory.
    pub async fn logout(&self) {
        self.tokens.clear();
        *self.state.write().await = SessionSnapshot::default();
        info!("session ended");
    }

    /// Current session state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    fn discard_persisted_session(&self) {
        self.tokens.remove_value(storage_keys::USER_DATA);
        self.tokens.remove_value(storage_keys::IS_LOGGED_IN);
        self.tokens.remove_value(storage_keys::LOGIN_PROVIDER);
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService").finish_non_exhaustive()
    }
}
