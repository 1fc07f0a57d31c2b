//! Request methods

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Method of a request template
///
/// Written in upper case; request files may use any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

const METHODS: [(HttpMethod, &str); 7] = [
    (HttpMethod::Get, "GET"),
    (HttpMethod::Post, "POST"),
    (HttpMethod::Put, "PUT"),
    (HttpMethod::Delete, "DELETE"),
    (HttpMethod::Patch, "PATCH"),
    (HttpMethod::Head, "HEAD"),
    (HttpMethod::Options, "OPTIONS"),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported method '{0}' (use GET, POST, PUT, DELETE, PATCH, HEAD or OPTIONS)")]
pub struct HttpMethodError(pub String);

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        METHODS
            .iter()
            .find(|(method, _)| method == self)
            .map_or("GET", |(_, name)| *name)
    }

    /// GET, HEAD and OPTIONS requests never carry a body
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Options)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        METHODS
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(wanted))
            .map(|(method, _)| *method)
            .ok_or_else(|| HttpMethodError(wanted.to_string()))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = HttpMethodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_owned()
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        // Every name in METHODS is a valid method token
        reqwest::Method::from_bytes(method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET)
    }
}
