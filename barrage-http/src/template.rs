//! Request files
//!
//! A request file holds one already-resolved request as YAML or JSON:
//!
//! ```yaml
//! method: POST
//! url: https://api.example.com/orders
//! headers:
//!   Authorization: Bearer abc
//! body:
//!   sku: A-100
//!   quantity: 2
//! ```
//!
//! A structured `body` is sent as compact JSON and gets a JSON content type
//! unless the file sets one.

use crate::errors::{HttpError, HttpResult};
use crate::request::ResolvedRequest;
use crate::types::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// On-disk shape of a request file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTemplate {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<TemplateBody>,
}

/// Body as written in the file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateBody {
    Text(String),
    Structured(JsonValue),
}

impl RequestTemplate {
    /// Parse a template, choosing the format from the file extension
    pub fn parse(content: &str, extension: Option<&str>) -> HttpResult<Self> {
        match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Ok(serde_yaml::from_str(content)?),
        }
    }

    /// Turn the template into a request and validate it
    pub fn into_resolved(self) -> HttpResult<ResolvedRequest> {
        let mut headers: Vec<(String, String)> = self.headers.into_iter().collect();

        let body = match self.body {
            None => None,
            Some(TemplateBody::Text(text)) => Some(text),
            Some(TemplateBody::Structured(value)) => {
                if !headers
                    .iter()
                    .any(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                {
                    headers.push(("Content-Type".to_string(), "application/json".to_string()));
                }
                Some(serde_json::to_string(&value)?)
            }
        };

        if body.is_some() && !self.method.allows_body() {
            return Err(HttpError::InvalidTemplate(format!(
                "{} requests cannot carry a body",
                self.method
            )));
        }

        let request = ResolvedRequest {
            method: self.method,
            url: self.url,
            headers,
            body,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Load a request file from disk and resolve it into a sendable request
pub fn load_request_file(path: impl AsRef<Path>) -> HttpResult<ResolvedRequest> {
    let path = path.as_ref();
    debug!("Loading request file {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let extension = path.extension().and_then(|e| e.to_str());

    RequestTemplate::parse(&content, extension)?.into_resolved()
}
