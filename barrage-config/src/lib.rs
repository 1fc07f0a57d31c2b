//! Settings for the barrage stress-test engine
//!
//! [`BarrageConfig`] groups the settings by concern (execution limits, HTTP
//! client, logging, storage). [`ConfigLoader`] reads them from YAML and the
//! environment and validates the result.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use domains::utils::{serde_duration, serde_duration_millis};
pub use domains::{
    execution::ExecutionConfig, http::HttpConfig, logging::LoggingConfig, storage::StorageConfig,
    BarrageConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;
