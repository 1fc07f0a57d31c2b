//! Engine-wide limits applied to every stress test

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_range, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::utils::{serde_duration, serde_duration_millis};

/// Hard ceiling on workers per run
pub const MAX_CONCURRENT_CONNS: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Tightens the per-run connection ceiling; never above [`MAX_CONCURRENT_CONNS`]
    pub max_concurrent_conns: u32,

    /// Poll period of the interactive progress display, in milliseconds when bare
    #[serde(with = "serde_duration_millis")]
    pub progress_interval: Duration,

    /// Ceiling for one in-flight request
    #[serde(with = "serde_duration")]
    pub max_request_timeout: Duration,

    pub default_profile: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_conns: MAX_CONCURRENT_CONNS,
            progress_interval: Duration::from_millis(250),
            max_request_timeout: Duration::from_secs(30),
            default_profile: "default".to_string(),
        }
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_range(
            self.max_concurrent_conns,
            1,
            MAX_CONCURRENT_CONNS,
            "max_concurrent_conns",
            domain,
        )?;
        validate_positive(self.progress_interval.as_millis(), "progress_interval", domain)?;
        validate_positive(self.max_request_timeout.as_millis(), "max_request_timeout", domain)?;
        validate_required_string(&self.default_profile, "default_profile", domain)
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}
