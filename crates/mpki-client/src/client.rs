//! Main provider API client implementation.

use crate::api::*;
use crate::config::RateLimitConfig;
use governor::DefaultDirectRateLimiter;
use mpki_core::{ErrorList, MpkiError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-api-key";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Managed-PKI REST API client
#[derive(Clone)]
pub struct MpkiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    base_url: String,
    endpoint: url::Url,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl MpkiClient {
    /// Create a new client for `base_url` using default settings
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        MpkiClientBuilder::new(base_url, api_key).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> MpkiClientBuilder {
        MpkiClientBuilder::new(base_url, api_key)
    }

    /// Access profile endpoints
    #[must_use]
    pub fn profiles(&self) -> ProfileApi<'_> {
        ProfileApi::new(self)
    }

    /// Access certificate lifecycle endpoints
    #[must_use]
    pub fn certificates(&self) -> CertificateApi<'_> {
        CertificateApi::new(self)
    }

    /// Access certificate search endpoints
    #[must_use]
    pub fn search(&self) -> SearchApi<'_> {
        SearchApi::new(self)
    }

    /// The base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Perform a GET request
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let url = self.build_url(path);
        debug!(url = %url, "GET request");
        let response = self.send(self.inner.http.get(url)).await?;
        self.handle_response(response).await
    }

    /// Perform a POST request with JSON body
    pub(crate) async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        debug!(url = %url, "POST request");
        let response = self.send(self.inner.http.post(url).json(body)).await?;
        self.handle_response(response).await
    }

    /// Perform a GET request whose 400 response carries a provider error list
    pub(crate) async fn get_or_reject<T: DeserializeOwned>(
        &self,
        path: &[&str],
    ) -> Result<std::result::Result<T, ErrorList>> {
        let url = self.build_url(path);
        debug!(url = %url, "GET request");
        let response = self.send(self.inner.http.get(url)).await?;
        self.handle_rejectable(response, |body| serde_json::from_str(body).map_err(MpkiError::Json))
            .await
    }

    /// Perform a POST request whose 400 response carries a provider error list
    pub(crate) async fn post_or_reject<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<std::result::Result<T, ErrorList>> {
        let url = self.build_url(path);
        debug!(url = %url, "POST request");
        let response = self.send(self.inner.http.post(url).json(body)).await?;
        self.handle_rejectable(response, |body| serde_json::from_str(body).map_err(MpkiError::Json))
            .await
    }

    /// Perform a PUT request whose success body is returned verbatim
    pub(crate) async fn put_or_reject<B: serde::Serialize + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<std::result::Result<String, ErrorList>> {
        let url = self.build_url(path);
        debug!(url = %url, "PUT request");
        let response = self.send(self.inner.http.put(url).json(body)).await?;
        self.handle_rejectable(response, |body| Ok(body.to_string())).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        if let Some(limiter) = &self.inner.rate_limiter {
            limiter.until_ready().await;
        }

        request
            .send()
            .await
            .map_err(|e| MpkiError::Http(e.to_string()))
    }

    /// Append `path` to the base URL, percent-encoding each segment
    fn build_url(&self, path: &[&str]) -> url::Url {
        let mut url = self.inner.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path);
        }
        url
    }

    /// Handle an API response that returns JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await.map_err(|e| MpkiError::Http(e.to_string()))?;
            trace!(body = %body, "response body");
            serde_json::from_str(&body).map_err(MpkiError::Json)
        } else {
            Self::handle_error(status, response).await
        }
    }

    /// Handle a response where HTTP 400 is a structured provider rejection
    async fn handle_rejectable<T>(
        &self,
        response: reqwest::Response,
        parse: impl FnOnce(&str) -> Result<T> + Send,
    ) -> Result<std::result::Result<T, ErrorList>> {
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.map_err(|e| MpkiError::Http(e.to_string()))?;
            debug!(body = %body, "provider rejected request");
            let errors = serde_json::from_str(&body).unwrap_or_else(|_| ErrorList::default());
            return Ok(Err(errors));
        }

        if status.is_success() {
            let body = response.text().await.map_err(|e| MpkiError::Http(e.to_string()))?;
            trace!(body = %body, "response body");
            return parse(&body).map(Ok);
        }

        Self::handle_error(status, response).await
    }

    /// Convert an error response to an `MpkiError`
    async fn handle_error<T>(status: StatusCode, response: reqwest::Response) -> Result<T> {
        let url = response.url().to_string();
        let message = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(MpkiError::Unauthorized),
            404 => Err(MpkiError::NotFound { resource: url }),
            429 => {
                warn!("Rate limited by provider API");
                Err(MpkiError::RateLimited)
            }
            code => Err(MpkiError::Api { code, message }),
        }
    }
}

/// Builder for configuring an [`MpkiClient`]
pub struct MpkiClientBuilder {
    base_url: String,
    api_key: String,
    timeout: Duration,
    user_agent: String,
    rate_limit: Option<RateLimitConfig>,
}

impl MpkiClientBuilder {
    /// Create a new builder for the given base URL and API key
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("mpki-gateway/{}", env!("CARGO_PKG_VERSION")),
            rate_limit: None,
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Throttle outgoing requests
    #[must_use]
    pub const fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<MpkiClient> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| MpkiError::Config(format!("invalid base URL {}: {e}", self.base_url)))?;
        if parsed.cannot_be_a_base() {
            return Err(MpkiError::Config(format!("invalid base URL {}", self.base_url)));
        }

        let mut api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| MpkiError::Config("API key contains invalid header characters".into()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| MpkiError::Http(e.to_string()))?;

        Ok(MpkiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.base_url.trim_end_matches('/').to_string(),
                endpoint: parsed,
                rate_limiter: self.rate_limit.map(RateLimitConfig::limiter),
            }),
        })
    }
}
