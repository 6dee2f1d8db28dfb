//! # MoodLoop Client
//!
//! HTTP and authentication infrastructure for the MoodLoop service:
//! - Per-session token storage ([`store`])
//! - Unauthenticated refresh client ([`refresh`])
//! - Single-flight refresh coordinator ([`coordinator`])
//! - Authenticated API client with 401 refresh-and-replay ([`api`])
//! - Session state service ([`session`])
//! - Typed endpoint wrappers ([`endpoints`])
//!
//! ## Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use moodloop_client::api::ApiClient;
//! use moodloop_client::config::ApiConfig;
//! use moodloop_client::coordinator::RefreshCoordinator;
//! use moodloop_client::refresh::RefreshClient;
//! use moodloop_client::session::SessionService;
//! use moodloop_client::store::{InMemorySessionStore, TokenStore};
//!
//! # fn main() -> Result<(), moodloop_client::errors::ApiError> {
//! let config = ApiConfig::from_env();
//! let tokens = TokenStore::new(Arc::new(InMemorySessionStore::new()));
//! let refresh = Arc::new(RefreshCoordinator::new(
//!     Arc::new(RefreshClient::new(&config)?),
//!     tokens.clone(),
//! ));
//! let client = Arc::new(ApiClient::new(&config, tokens.clone(), refresh)?);
//! let session = SessionService::new(tokens);
//! # let _ = (client, session);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod api;
pub mod config;
pub mod coordinator;
pub mod endpoints;
pub mod errors;
pub mod http;
pub mod refresh;
pub mod session;
pub mod store;

pub use api::ApiClient;
pub use config::ApiConfig;
pub use coordinator::RefreshCoordinator;
pub use endpoints::{AuthApi, CommentsApi, PostsApi, RecommendApi, UsersApi};
pub use errors::ApiError;
pub use refresh::RefreshClient;
pub use session::{SessionService, SessionSnapshot};
pub use store::{InMemorySessionStore, SessionStore, TokenStore};
