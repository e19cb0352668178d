//! HTTP client for the Cartas backend API.
//!
//! Handles bearer authentication, custom headers, per-request timeouts and
//! the translation of error envelopes into `CtError`. Requests are never
//! retried automatically.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use cartas_core::config::{ApiConfig, AppConfig};
use cartas_core::error::{CtError, CtResult};

use crate::response::{ErrorBody, ListResponse};

/// HTTP client for the Cartas backend.
///
/// Cheap to clone; clones share the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Backend origin without trailing slash (e.g. "https://api.cartas.app").
    base_url: String,
    /// Timeout applied to every non-streaming request.
    timeout: Duration,
    /// Bearer token, set after login or when restored from storage.
    token: Arc<RwLock<Option<String>>>,
    /// Custom headers from config.
    custom_headers: Vec<(String, String)>,
}

impl ApiClient {
    /// Create a new ApiClient from API configuration.
    ///
    /// No client-wide timeout is installed: the streamed generation request
    /// must be able to run as long as the backend keeps writing.
    pub fn new(config: &ApiConfig) -> CtResult<Self> {
        let base_url = AppConfig::sanitize_base_url(&config.base_url);
        if base_url.is_empty() {
            return Err(CtError::MissingConfig("api.base_url".into()));
        }

        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .user_agent(format!("cartas/{}", cartas_core::constants::APP_VERSION))
            .build()
            .map_err(|e| CtError::Http(format!("failed to build HTTP client: {e}")))?;

        let custom_headers = config
            .custom_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            inner,
            base_url,
            timeout: Duration::from_millis(config.api_timeout_ms),
            token: Arc::new(RwLock::new(None)),
            custom_headers,
        })
    }

    /// Backend origin.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the bearer token.
    pub async fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().await;
        *guard = token.filter(|t| !t.trim().is_empty());
        debug!("bearer token {}", if guard.is_some() { "set" } else { "cleared" });
    }

    /// Whether a bearer token is present.
    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request with auth and custom headers applied. `timeout` of
    /// `None` leaves the request unbounded.
    pub(crate) async fn build_request(
        &self,
        method: Method,
        path: &str,
        timeout: Option<Duration>,
    ) -> RequestBuilder {
        let mut builder = self.inner.request(method, self.url(path));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        if let Some(token) = self.token.read().await.as_deref() {
            builder = builder.bearer_auth(token);
        }
        for (key, value) in &self.custom_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    /// Send a request and convert failures into `CtError`.
    pub(crate) async fn send(builder: RequestBuilder) -> CtResult<Response> {
        let response = builder.send().await.map_err(Self::classify_error)?;
        Self::check_status(response).await
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> CtResult<Response> {
        debug!("{} {}", method, path);
        let mut builder = self.build_request(method, path, Some(self.timeout)).await;
        if let Some(b) = body {
            builder = builder.json(b);
        }
        Self::send(builder).await
    }

    // --- Public HTTP methods ---

    /// GET and deserialize the body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> CtResult<T> {
        let resp = self.request::<()>(Method::GET, path, None).await?;
        Self::parse_body(resp).await
    }

    /// GET a list that may come bare or wrapped.
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> CtResult<Vec<T>> {
        let list: ListResponse<T> = self.get_json(path).await?;
        Ok(list.into_vec())
    }

    /// POST a JSON body and deserialize the response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> CtResult<T> {
        let resp = self.request(Method::POST, path, Some(body)).await?;
        Self::parse_body(resp).await
    }

    /// PUT a JSON body and deserialize the response.
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> CtResult<T> {
        let resp = self.request(Method::PUT, path, Some(body)).await?;
        Self::parse_body(resp).await
    }

    /// POST without caring about the response body.
    pub async fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> CtResult<()> {
        self.request(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    /// DELETE a resource.
    pub async fn delete(&self, path: &str) -> CtResult<()> {
        self.request::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    // --- Response helpers ---

    /// Deserialize a response body.
    pub async fn parse_body<T: DeserializeOwned>(response: Response) -> CtResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| CtError::Serialization(format!("failed to parse response: {e}")))
    }

    /// Turn a non-2xx response into the matching `CtError`.
    async fn check_status(response: Response) -> CtResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let err = Self::error_from_body(status, &raw);
        warn!("request failed: {err}");
        Err(err)
    }

    /// Map a status and raw error body to a `CtError`. An `upsell` field
    /// always wins so the caller can show the upgrade prompt.
    pub fn error_from_body(status: StatusCode, raw: &str) -> CtError {
        let body = ErrorBody::parse(raw);
        let message = body.text().unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        let upsell = body.upsell_key();

        if status == StatusCode::UNAUTHORIZED && upsell.is_none() {
            return CtError::AuthFailed(message);
        }

        CtError::Api {
            status: status.as_u16(),
            message,
            upsell,
        }
    }

    /// Classify a reqwest error into a CtError variant.
    pub(crate) fn classify_error(e: reqwest::Error) -> CtError {
        if e.is_timeout() {
            CtError::Timeout(e.to_string())
        } else if e.is_connect() {
            CtError::Http(format!("connection failed: {e}"))
        } else {
            CtError::Http(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig {
            base_url: "localhost:3001/api/".into(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_url_building() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
        assert_eq!(client.url("/api/contacts"), "http://localhost:3001/api/contacts");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config = ApiConfig {
            base_url: "  ".into(),
            ..ApiConfig::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(CtError::MissingConfig(_))));
    }

    #[tokio::test]
    async fn test_token_shared_between_clones() {
        let client = ApiClient::new(&test_config()).unwrap();
        let clone = client.clone();
        client.set_token(Some("tok".into())).await;
        assert!(clone.has_token().await);
        clone.set_token(Some("   ".into())).await;
        assert!(!client.has_token().await);
    }

    #[test]
    fn test_error_mapping() {
        let err = ApiClient::error_from_body(StatusCode::UNAUTHORIZED, r#"{"error":"Token inválido"}"#);
        assert!(matches!(err, CtError::AuthFailed(ref m) if m == "Token inválido"));

        let err = ApiClient::error_from_body(
            StatusCode::FORBIDDEN,
            r#"{"error":"Solo Premium","upsell":"premium_tone"}"#,
        );
        assert_eq!(err.upsell_trigger(), Some("premium_tone"));

        let err = ApiClient::error_from_body(StatusCode::BAD_GATEWAY, "");
        match err {
            CtError::Api { status, message, upsell } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
                assert!(upsell.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
