//! Resolved requests and the responses they produce

use crate::errors::{HttpError, HttpResult};
use crate::types::HttpMethod;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// A fully resolved request: no template variables remain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ResolvedRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check that the request can be sent at all
    ///
    /// Problems found here are configuration errors, reported before a run starts.
    pub fn validate(&self) -> HttpResult<()> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                self.url,
                parsed.scheme()
            )));
        }

        for (name, value) in &self.headers {
            HeaderName::from_str(name).map_err(|_| HttpError::InvalidHeaderName(name.clone()))?;
            HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeaderValue(name.clone()))?;
        }

        Ok(())
    }
}

/// Response to a single executed request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_plain_request() {
        let request = ResolvedRequest::new(HttpMethod::Post, "http://127.0.0.1:8080/orders")
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        assert!(request.validate().is_ok());
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let request = ResolvedRequest::new(HttpMethod::Get, "localhost/no-scheme");
        assert!(matches!(request.validate(), Err(HttpError::InvalidUrl(_))));

        let request = ResolvedRequest::new(HttpMethod::Get, "ftp://example.com/file");
        assert!(matches!(request.validate(), Err(HttpError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_rejects_bad_headers() {
        let request = ResolvedRequest::new(HttpMethod::Get, "http://example.com")
            .with_header("bad header", "x");
        assert!(matches!(
            request.validate(),
            Err(HttpError::InvalidHeaderName(_))
        ));

        let request = ResolvedRequest::new(HttpMethod::Get, "http://example.com")
            .with_header("X-Token", "line\nbreak");
        assert!(matches!(
            request.validate(),
            Err(HttpError::InvalidHeaderValue(_))
        ));
    }
}
