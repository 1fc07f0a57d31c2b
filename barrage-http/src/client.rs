//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::{HttpError, HttpResult};
use crate::request::{HttpResponse, ResolvedRequest};
use crate::types::HttpMethod;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Executes one resolved request
///
/// Implementations must be cancellation-safe: callers abort an in-flight
/// request by dropping the returned future.
#[async_trait::async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &ResolvedRequest) -> HttpResult<HttpResponse>;
}

/// Canned response served in offline mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Simulated latency before the response is returned
    pub delay: Duration,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// HTTP Manager for executing requests with mock support
///
/// A single pooled client is shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct HttpManager {
    client: Client,
    offline: bool,
    mocks: HashMap<String, MockResponse>,
    config: HttpConfig,
}

impl HttpManager {
    /// Create a new HttpManager in online mode with default configuration
    pub fn new() -> HttpResult<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HttpManager with specific configuration
    pub fn with_config(config: HttpConfig) -> HttpResult<Self> {
        debug!(
            "Creating HttpManager with timeout: {}s, pool size: {}",
            config.timeout.as_secs(),
            config.pool_max_idle_per_host
        );

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ));

        if let Some(ref proxy) = config.http_proxy {
            builder = builder.proxy(reqwest::Proxy::http(proxy)?);
        }
        if let Some(ref proxy) = config.https_proxy {
            builder = builder.proxy(reqwest::Proxy::https(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            offline: false,
            mocks: HashMap::new(),
            config,
        })
    }

    /// Set offline mode
    pub fn set_offline(&mut self) {
        self.offline = true;
        debug!("HttpManager set to offline mode");
    }

    /// Add a single HTTP mock, served in offline mode
    pub fn add_mock(&mut self, method: HttpMethod, url: &str, response: MockResponse) {
        self.mocks.insert(mock_key(method, url), response);
        debug!("Added HTTP mock for {} {}", method, url);
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    async fn execute_mock(&self, request: &ResolvedRequest) -> HttpResult<HttpResponse> {
        let key = mock_key(request.method, &request.url);
        let start = Instant::now();

        let mock = self.mocks.get(&key).or_else(|| {
            // Fall back to a prefix match so query strings still hit the mock
            self.mocks.iter().find_map(|(k, v)| {
                let (method, url) = k.split_once(':')?;
                (method == request.method.as_str() && request.url.starts_with(url)).then_some(v)
            })
        });

        let Some(mock) = mock else {
            return Err(HttpError::MockNotFound(key));
        };

        if !mock.delay.is_zero() {
            tokio::time::sleep(mock.delay).await;
        }

        Ok(HttpResponse {
            status: mock.status,
            headers: HashMap::new(),
            body: mock.body.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait::async_trait]
impl RequestExecutor for HttpManager {
    async fn execute(&self, request: &ResolvedRequest) -> HttpResult<HttpResponse> {
        if self.offline {
            return self.execute_mock(request).await;
        }

        trace!("Building {} request to {}", request.method, request.url);
        let mut builder = self
            .client
            .request(reqwest::Method::from(request.method), &request.url);

        if !request.headers.is_empty() {
            let mut header_map = HeaderMap::with_capacity(request.headers.len());
            for (key, value) in &request.headers {
                let name = HeaderName::from_str(key)
                    .map_err(|_| HttpError::InvalidHeaderName(key.to_string()))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|_| HttpError::InvalidHeaderValue(key.to_string()))?;
                header_map.append(name, value);
            }
            builder = builder.headers(header_map);
        }

        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let duration_ms = start.elapsed().as_millis() as u64;

        trace!("HTTP response received: {} in {} ms", status, duration_ms);

        Ok(HttpResponse {
            status,
            headers,
            body,
            duration_ms,
        })
    }
}

impl HttpManager {
    fn classify(&self, error: reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout(self.config.timeout.as_millis() as u64)
        } else {
            HttpError::NetworkError(error)
        }
    }
}

fn mock_key(method: HttpMethod, url: &str) -> String {
    format!("{}:{}", method.as_str(), url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_manager() -> HttpManager {
        let mut manager = HttpManager::new().unwrap();
        manager.set_offline();
        manager
    }

    #[tokio::test]
    async fn test_offline_mock_exact_match() {
        let mut manager = offline_manager();
        manager.add_mock(
            HttpMethod::Get,
            "http://api.test/users",
            MockResponse::new(200, r#"{"users":[]}"#),
        );

        let response = manager
            .execute(&ResolvedRequest::new(HttpMethod::Get, "http://api.test/users"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"users":[]}"#);
    }

    #[tokio::test]
    async fn test_offline_mock_prefix_match() {
        let mut manager = offline_manager();
        manager.add_mock(HttpMethod::Get, "http://api.test/search", MockResponse::new(204, ""));

        let response = manager
            .execute(&ResolvedRequest::new(
                HttpMethod::Get,
                "http://api.test/search?q=rust",
            ))
            .await
            .unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_offline_mock_method_must_match() {
        let mut manager = offline_manager();
        manager.add_mock(HttpMethod::Get, "http://api.test/x", MockResponse::new(200, "ok"));

        let err = manager
            .execute(&ResolvedRequest::new(HttpMethod::Post, "http://api.test/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::MockNotFound(_)));
        assert!(err.is_transport());
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_mock_delay() {
        let mut manager = offline_manager();
        manager.add_mock(
            HttpMethod::Get,
            "http://api.test/slow",
            MockResponse::new(200, "late").with_delay(Duration::from_millis(200)),
        );

        let response = manager
            .execute(&ResolvedRequest::new(HttpMethod::Get, "http://api.test/slow"))
            .await
            .unwrap();
        assert_eq!(response.body, "late");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let manager = HttpManager::with_config(HttpConfig {
            timeout: Duration::from_secs(2),
            ..HttpConfig::default()
        })
        .unwrap();

        // Port 9 (discard) is closed on test hosts
        let err = manager
            .execute(&ResolvedRequest::new(HttpMethod::Get, "http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
