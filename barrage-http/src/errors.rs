//! Failures while loading or sending a request

/// Error from request loading or execution
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("no response within {0} ms")]
    Timeout(u64),

    /// Offline client has no canned response for `METHOD url`
    #[error("no mock registered for {0}")]
    MockNotFound(String),

    #[error("bad URL {0}")]
    InvalidUrl(String),

    #[error("bad header name '{0}'")]
    InvalidHeaderName(String),

    #[error("bad value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("bad request file: {0}")]
    InvalidTemplate(String),

    #[error("cannot read request file: {0}")]
    TemplateRead(#[from] std::io::Error),

    #[error("request file is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("request file is not valid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

pub type HttpResult<T> = Result<T, HttpError>;

impl HttpError {
    /// No usable response was obtained; counted as a transport error by the engine
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HttpError::NetworkError(_) | HttpError::Timeout(_) | HttpError::MockNotFound(_)
        )
    }
}
