//! HTTP configuration

use barrage_config::domains::http::HttpConfig as ConfigHttpConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connection establishment timeout
    pub connect_timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User agent string
    pub user_agent: String,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Maximum idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// How long an idle pooled connection is kept
    pub pool_idle_timeout: Duration,

    /// Optional proxy for plain HTTP targets
    pub http_proxy: Option<String>,

    /// Optional proxy for HTTPS targets
    pub https_proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for HttpConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            max_redirects: config.max_redirects,
            user_agent: config.user_agent,
            verify_ssl: config.verify_ssl,
            pool_max_idle_per_host: config.pool.max_idle_per_host,
            pool_idle_timeout: config.pool.idle_timeout,
            http_proxy: config.proxy.http,
            https_proxy: config.proxy.https,
        }
    }
}

impl HttpConfig {
    /// Cap the request timeout, e.g. to the engine's per-request ceiling
    pub fn with_max_timeout(mut self, ceiling: Duration) -> Self {
        self.timeout = self.timeout.min(ceiling);
        self.connect_timeout = self.connect_timeout.min(self.timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_domain() {
        let mut domain = ConfigHttpConfig::default();
        domain.timeout = Duration::from_secs(5);
        domain.connect_timeout = Duration::from_secs(2);
        domain.proxy.http = Some("http://proxy:3128".to_string());

        let config = HttpConfig::from(domain);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.http_proxy.as_deref(), Some("http://proxy:3128"));
        assert!(config.https_proxy.is_none());
    }

    #[test]
    fn test_with_max_timeout() {
        let config = HttpConfig::default().with_max_timeout(Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));

        let config = HttpConfig::default().with_max_timeout(Duration::from_secs(600));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
