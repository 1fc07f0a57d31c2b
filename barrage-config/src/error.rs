//! Errors raised while loading or validating settings

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read
    #[error("cannot read settings file: {0}")]
    FileReadError(#[from] std::io::Error),

    /// The settings file is not valid YAML for [`BarrageConfig`](crate::BarrageConfig)
    #[error("cannot parse settings: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `BARRAGE_*` override could not be parsed
    #[error("environment variable {var} is invalid: {reason}")]
    EnvError { var: String, reason: String },

    /// A value was parsed but is not acceptable for its domain
    #[error("invalid {domain} settings: {message}")]
    DomainError { domain: String, message: String },
}

impl ConfigError {
    /// Shorthand for a [`ConfigError::DomainError`]
    pub fn domain(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DomainError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// The domain a validation failure belongs to
    pub fn domain_name(&self) -> Option<&str> {
        match self {
            Self::DomainError { domain, .. } => Some(domain.as_str()),
            _ => None,
        }
    }
}
