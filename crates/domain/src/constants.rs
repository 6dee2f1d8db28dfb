//! Domain constants shared across MoodLoop crates

/// Default production API origin.
pub const DEFAULT_API_BASE_URL: &str = "https://api.moodloop.app";

/// Environment variable overriding the API base URL.
pub const ENV_API_BASE_URL: &str = "MOODLOOP_API_BASE_URL";

/// Environment variable selecting dev mode (same-origin, proxied base URL).
pub const ENV_DEV_MODE: &str = "MOODLOOP_DEV";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default time-to-live for de-duplicated request results, in milliseconds.
pub const DEFAULT_DEDUP_TTL_MS: u64 = 5000;

/// Session storage keys.
///
/// Key names match the wire/storage layout of the service so a session
/// written by one component is readable by the others.
pub mod storage_keys {
    /// JSON string holding the bearer access token.
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// JSON object mirroring the logged-in user.
    pub const USER: &str = "user";
    /// Bootstrap flag consulted on session hydration.
    pub const IS_LOGGED_IN: &str = "isLoggedIn";
    /// Login provider recorded at login time.
    pub const LOGIN_PROVIDER: &str = "loginProvider";
    /// Bootstrap copy of the user object for session hydration.
    pub const USER_DATA: &str = "userData";
}

/// REST endpoint paths (relative to the API base URL).
pub mod endpoints {
    pub const AUTH_REFRESH: &str = "/v1/auth/refresh";
    pub const AUTH_STATUS: &str = "/v1/auth/status";
    pub const AUTH_LOGOUT: &str = "/v1/auth/logout";
    pub const POSTS: &str = "/v1/post";
    pub const COMMENTS: &str = "/v1/comments";
    pub const USERS: &str = "/v1/users";
    pub const RECOMMEND: &str = "/v1/recommend";
    pub const TAG_SUGGEST: &str = "/v1/tag/suggest";
}
