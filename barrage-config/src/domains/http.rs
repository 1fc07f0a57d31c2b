//! Settings for the outbound HTTP client

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::execution::MAX_CONCURRENT_CONNS;
use super::utils::serde_duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout; also capped by `execution.max_request_timeout`
    #[serde(with = "serde_duration")]
    pub timeout: Duration,

    /// Time allowed for the TCP and TLS handshake
    #[serde(with = "serde_duration")]
    pub connect_timeout: Duration,

    pub max_redirects: u32,
    pub user_agent: String,
    pub verify_ssl: bool,
    pub pool: PoolConfig,

    #[serde(skip_serializing_if = "ProxyConfig::is_empty")]
    pub proxy: ProxyConfig,
}

/// Keep-alive pool of the shared client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_idle_per_host: usize,
    #[serde(with = "serde_duration")]
    pub idle_timeout: Duration,
}

/// Proxies per target scheme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https: Option<String>,
}

impl ProxyConfig {
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
            user_agent: concat!("barrage/", env!("CARGO_PKG_VERSION")).to_string(),
            verify_ssl: true,
            pool: PoolConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            // Room for one idle connection per worker at full concurrency
            max_idle_per_host: MAX_CONCURRENT_CONNS as usize,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_positive(self.timeout.as_millis(), "timeout", domain)?;
        validate_positive(self.connect_timeout.as_millis(), "connect_timeout", domain)?;
        if self.connect_timeout > self.timeout {
            return Err(self.validation_error(format!(
                "connect_timeout ({}s) exceeds timeout ({}s)",
                self.connect_timeout.as_secs(),
                self.timeout.as_secs()
            )));
        }
        validate_required_string(&self.user_agent, "user_agent", domain)?;

        self.pool.validate()?;
        self.proxy.validate()
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

impl Validatable for PoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_idle_per_host, "max_idle_per_host", self.domain_name())?;
        validate_positive(self.idle_timeout.as_millis(), "idle_timeout", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "http.pool"
    }
}

impl Validatable for ProxyConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [("http", &self.http), ("https", &self.https)] {
            if let Some(url) = value {
                validate_url(url, field, self.domain_name())?;
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http.proxy"
    }
}
