//! Authenticated API client
//!
//! Generic HTTP verbs with two cross-cutting behaviors:
//!
//! - Outbound: the current access token (if any) is attached as a
//!   bearer header; a missing token never blocks the request.
//! - Inbound: a 401 triggers exactly one refresh-and-replay per
//!   logical request through the shared [`RefreshCoordinator`]. The
//!   replay re-reads the token store, so every request queued behind a
//!   refresh resumes with the new bearer value. A second 401 after the
//!   replay surfaces as an ordinary error.
//!
//! Responses are deserialized as-is; the service's envelope is left
//! for endpoint wrappers to unwrap.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::ApiConfig;
use crate::coordinator::RefreshCoordinator;
use crate::errors::ApiError;
use crate::http::HttpClient;
use crate::store::TokenStore;

/// HTTP client for authenticated service calls.
pub struct ApiClient {
    http: HttpClient,
    tokens: TokenStore,
    refresh: Arc<RefreshCoordinator>,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the transport cannot be built.
    pub fn new(
        config: &ApiConfig,
        tokens: TokenStore,
        refresh: Arc<RefreshCoordinator>,
    ) -> Result<Self, ApiError> {
        // The watchdog in `execute` owns the deadline; the transport
        // cap only reaps connections that outlive a dropped future.
        let http =
            HttpClient::builder().timeout(config.timeout + Duration::from_secs(5)).build()?;

        Ok(Self {
            http,
            tokens,
            refresh,
            base_url: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    /// Execute a GET request.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    /// Execute a POST request with a JSON body.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::POST, path, Some(Self::to_body(body)?)).await
    }

    /// Execute a PUT request with a JSON body.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::PUT, path, Some(Self::to_body(body)?)).await
    }

    /// Execute a PATCH request with a JSON body.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::PATCH, path, Some(Self::to_body(body)?)).await
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::DELETE, path, None).await
    }

    fn to_body<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|err| ApiError::Client(format!("failed to serialize body: {err}")))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut replayed = false;

        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .header("Content-Type", "application/json");

            // A missing token never blocks the request; the call goes
            // out unauthenticated and the server decides.
            if let Some(token) = self.tokens.access_token() {
                request = request.bearer_auth(token);
            }

            if let Some(body) = body.as_ref() {
                request = request.json(body);
            }

            let response = match tokio::time::timeout(self.timeout, self.http.send(request)).await
            {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(ApiError::Timeout(self.timeout)),
            };

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !replayed {
                // One replay per logical request; a 401 on the replay
                // falls through to the ordinary error path below.
                replayed = true;
                debug!(%url, "401 received, refreshing token and replaying");
                self.refresh.refresh_access_token().await?;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &url, &body));
            }

            // 204/205 never carry a body; deserialize from null so
            // unit responses work.
            if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
                return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                    ApiError::Client(format!(
                        "no-content response ({}) cannot populate the requested type",
                        status.as_u16()
                    ))
                });
            }

            return response
                .json()
                .await
                .map_err(|err| ApiError::Client(format!("failed to parse response: {err}")));
        }
    }
}

/// Race a request against a cancellation token.
///
/// Cancellation drops the request future, which aborts the underlying
/// call; the distinguished [`ApiError::Aborted`] outcome lets callers
/// skip error handling for teardown-driven cancellation. Apply this
/// around de-duplicated call sites, not inside them, so one consumer's
/// cancellation never disturbs other waiters on a shared entry.
///
/// # Errors
/// Returns `ApiError::Aborted` if the token fires first, otherwise the
/// request's own outcome.
pub async fn with_cancellation<T>(
    token: &CancellationToken,
    request: impl std::future::Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        () = token.cancelled() => Err(ApiError::Aborted),
        outcome = request => outcome,
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::refresh::RefreshClient;
    use crate::store::InMemorySessionStore;

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    struct TestResponse {
        message: String,
    }

    fn client_for(server: &MockServer, tokens: &TokenStore) -> ApiClient {
        let config = ApiConfig::with_base_url(server.uri());
        let refresh = Arc::new(RefreshCoordinator::new(
            Arc::new(RefreshClient::new(&config).unwrap()),
            tokens.clone(),
        ));
        ApiClient::new(&config, tokens.clone(), refresh).unwrap()
    }

    fn fresh_tokens() -> TokenStore {
        TokenStore::new(Arc::new(InMemorySessionStore::new()))
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/me"))
            .and(header("Authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(TestResponse { message: "hi".to_string() }),
            )
            .mount(&server)
            .await;

        let tokens = fresh_tokens();
        tokens.set_access_token("tok-1");
        let client = client_for(&server, &tokens);

        let result: TestResponse = client.get("/v1/users/me").await.unwrap();
        assert_eq!(result.message, "hi");
    }

    #[tokio::test]
    async fn missing_token_sends_request_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(TestResponse { message: "anon".to_string() }),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, &fresh_tokens());
        let result: TestResponse = client.get("/v1/auth/status").await.unwrap();
        assert_eq!(result.message, "anon");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn replays_once_after_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/post"))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/post"))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(TestResponse { message: "replayed".to_string() }),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"accessToken": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = fresh_tokens();
        tokens.set_access_token("stale");
        let client = client_for(&server, &tokens);

        let result: TestResponse = client.get("/v1/post").await.unwrap();
        assert_eq!(result.message, "replayed");
        assert_eq!(tokens.access_token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn second_401_propagates_instead_of_looping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/post"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"accessToken": "fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = fresh_tokens();
        tokens.set_access_token("stale");
        let client = client_for(&server, &tokens);

        let err = client.get::<TestResponse>("/v1/post").await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));

        // 401 -> refresh -> replay -> 401 again, then stop.
        let data_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/v1/post")
            .count();
        assert_eq!(data_requests, 2);
    }

    #[tokio::test]
    async fn refresh_failure_rejects_original_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/post"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let tokens = fresh_tokens();
        tokens.set_access_token("stale");
        let client = client_for(&server, &tokens);

        let err = client.get::<TestResponse>("/v1/post").await.unwrap_err();
        assert!(matches!(err, ApiError::RefreshFailed(_)));
        assert_eq!(tokens.access_token(), None);
    }

    #[tokio::test]
    async fn no_content_deserializes_as_unit() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/comments/9"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server, &fresh_tokens());
        let result: Result<(), ApiError> = client.delete("/v1/comments/9").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn slow_response_times_out_without_touching_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/recommend"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = ApiConfig::with_base_url(server.uri())
            .timeout(std::time::Duration::from_millis(50));
        let tokens = fresh_tokens();
        let refresh = Arc::new(RefreshCoordinator::new(
            Arc::new(RefreshClient::new(&config).unwrap()),
            tokens.clone(),
        ));
        let client = ApiClient::new(&config, tokens, refresh).unwrap();

        let err = client.get::<TestResponse>("/v1/recommend").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
    }

    #[tokio::test]
    async fn cancellation_yields_aborted_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/post"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(100)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, &fresh_tokens());
        let token = CancellationToken::new();
        token.cancel();

        let err = with_cancellation(&token, client.get::<TestResponse>("/v1/post"))
            .await
            .unwrap_err();
        assert!(err.is_abort());
    }
}
