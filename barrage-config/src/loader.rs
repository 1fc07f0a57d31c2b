//! Reading settings from a file and `BARRAGE_*` environment variables
//!
//! Precedence, lowest first: built-in defaults, the YAML file, environment.
//! The merged result is validated before it is returned.

use crate::domains::execution::ExecutionConfig;
use crate::domains::http::HttpConfig;
use crate::domains::logging::LoggingConfig;
use crate::domains::storage::StorageConfig;
use crate::domains::utils::parse_duration;
use crate::domains::BarrageConfig;
use crate::error::{ConfigError, ConfigResult};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub struct ConfigLoader {
    prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::with_prefix("BARRAGE")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<BarrageConfig> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading settings file");
        let text = std::fs::read_to_string(path)?;
        // An empty file is valid and means "all defaults"
        let config = if text.trim().is_empty() {
            BarrageConfig::default()
        } else {
            serde_yaml::from_str(&text)?
        };
        self.finish(config)
    }

    pub fn from_env(&self) -> ConfigResult<BarrageConfig> {
        self.finish(BarrageConfig::default())
    }

    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<BarrageConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn finish(&self, mut config: BarrageConfig) -> ConfigResult<BarrageConfig> {
        self.override_execution(&mut config.execution)?;
        self.override_http(&mut config.http)?;
        self.override_logging(&mut config.logging)?;
        self.override_storage(&mut config.storage)?;
        config.validate_all()?;
        Ok(config)
    }

    fn override_execution(&self, execution: &mut ExecutionConfig) -> ConfigResult<()> {
        self.parsed("MAX_CONCURRENT_CONNS", &mut execution.max_concurrent_conns)?;
        self.duration(
            "PROGRESS_INTERVAL_MS",
            Duration::from_millis,
            &mut execution.progress_interval,
        )?;
        self.duration(
            "REQUEST_TIMEOUT",
            Duration::from_secs,
            &mut execution.max_request_timeout,
        )?;
        self.parsed("PROFILE", &mut execution.default_profile)
    }

    fn override_http(&self, http: &mut HttpConfig) -> ConfigResult<()> {
        self.duration("HTTP_TIMEOUT", Duration::from_secs, &mut http.timeout)?;
        self.parsed("HTTP_USER_AGENT", &mut http.user_agent)?;
        self.parsed("HTTP_VERIFY_SSL", &mut http.verify_ssl)
    }

    fn override_logging(&self, logging: &mut LoggingConfig) -> ConfigResult<()> {
        self.parsed("LOG_LEVEL", &mut logging.level)?;
        self.parsed("LOG_FORMAT", &mut logging.format)
    }

    fn override_storage(&self, storage: &mut StorageConfig) -> ConfigResult<()> {
        if let Some(dir) = self.var("DATA_DIR") {
            storage.data_dir = Some(PathBuf::from(dir));
        }
        self.parsed("MAX_RUNS_PER_PROFILE", &mut storage.max_runs_per_profile)
    }

    /// Replace `slot` with the parsed variable, if set
    fn parsed<T>(&self, name: &str, slot: &mut T) -> ConfigResult<()>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.var(name) else {
            return Ok(());
        };
        *slot = raw.trim().parse().map_err(|e: T::Err| self.env_error(name, e))?;
        Ok(())
    }

    fn duration(
        &self,
        name: &str,
        bare: fn(u64) -> Duration,
        slot: &mut Duration,
    ) -> ConfigResult<()> {
        let Some(raw) = self.var(name) else {
            return Ok(());
        };
        *slot = parse_duration(&raw, bare).map_err(|e| self.env_error(name, e))?;
        Ok(())
    }

    fn var(&self, name: &str) -> Option<String> {
        let key = self.key(name);
        let value = std::env::var(&key).ok()?;
        debug!(variable = %key, "Applying environment override");
        Some(value)
    }

    fn key(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }

    fn env_error(&self, name: &str, reason: impl Display) -> ConfigError {
        ConfigError::EnvError {
            var: self.key(name),
            reason: reason.to_string(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
