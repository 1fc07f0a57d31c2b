//! Error types for the stress-test engine

use barrage_config::ConfigError;
use barrage_http::HttpError;
use thiserror::Error;

/// Errors surfaced to the caller of the engine
///
/// Per-request transport and validation failures never appear here; they are
/// absorbed by the workers and counted.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid stress test configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] HttpError),

    #[error("Invalid executor state: {0}")]
    InvalidState(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
