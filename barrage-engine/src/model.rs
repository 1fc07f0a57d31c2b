//! Stress-test definitions and run records

use barrage_config::validation::{validate_positive, validate_range};
use barrage_config::{ConfigResult, Validatable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::aggregator::LatencyStats;
use crate::validator::CompiledExpectations;

/// Ceiling for `concurrent_conns` regardless of engine settings
pub const MAX_CONCURRENT_CONNS: u32 = barrage_config::domains::execution::MAX_CONCURRENT_CONNS;

/// User-authored stress-test definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestConfig {
    /// Assigned by the store; `None` until the config is saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Unique within a profile; an empty name marks a scratch run
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_profile_name")]
    pub profile_name: String,

    /// Path of the request file to send
    #[serde(default)]
    pub request_file: String,

    /// Steady-state number of workers
    pub concurrent_conns: u32,

    /// Request budget shared by all workers
    pub total_requests: u64,

    /// Seconds over which workers are started; 0 starts them all at once
    #[serde(default)]
    pub ramp_up_duration_sec: u64,

    /// Wall-clock budget in seconds; 0 means bounded by `total_requests` only
    #[serde(default)]
    pub test_duration_sec: u64,

    #[serde(flatten)]
    pub expectations: Expectations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response expectations, all optional and independently combinable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectations {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub expected_status_codes: BTreeSet<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_body_exact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_body_contains: Option<String>,

    /// Regular expression the body must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_body_pattern: Option<String>,

    /// JSON field path to expected value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expected_body_fields: BTreeMap<String, String>,
}

impl Expectations {
    pub fn is_empty(&self) -> bool {
        self.expected_status_codes.is_empty()
            && self.expected_body_exact.is_none()
            && self.expected_body_contains.is_none()
            && self.expected_body_pattern.is_none()
            && self.expected_body_fields.is_empty()
    }
}

fn default_profile_name() -> String {
    "default".to_string()
}

impl StressTestConfig {
    /// Create an unnamed config with no expectations
    pub fn new(concurrent_conns: u32, total_requests: u64) -> Self {
        Self {
            id: None,
            name: String::new(),
            profile_name: default_profile_name(),
            request_file: String::new(),
            concurrent_conns,
            total_requests,
            ramp_up_duration_sec: 0,
            test_duration_sec: 0,
            expectations: Expectations::default(),
            updated_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile_name = profile.into();
        self
    }

    pub fn with_request_file(mut self, path: impl Into<String>) -> Self {
        self.request_file = path.into();
        self
    }

    pub fn with_ramp_up(mut self, secs: u64) -> Self {
        self.ramp_up_duration_sec = secs;
        self
    }

    pub fn with_duration(mut self, secs: u64) -> Self {
        self.test_duration_sec = secs;
        self
    }

    pub fn with_expectations(mut self, expectations: Expectations) -> Self {
        self.expectations = expectations;
        self
    }

    /// Scratch configs are run ad hoc and never persisted
    pub fn is_scratch(&self) -> bool {
        self.name.trim().is_empty()
    }

    pub fn ramp_up(&self) -> Duration {
        Duration::from_secs(self.ramp_up_duration_sec)
    }

    /// Wall-clock budget, if the run is bounded by time
    pub fn test_duration(&self) -> Option<Duration> {
        (self.test_duration_sec > 0).then(|| Duration::from_secs(self.test_duration_sec))
    }
}

impl StressTestConfig {
    /// Validate and hand back the compiled expectations for a run
    pub fn prepare(&self) -> ConfigResult<CompiledExpectations> {
        validate_range(
            self.concurrent_conns,
            1,
            MAX_CONCURRENT_CONNS,
            "concurrent_conns",
            self.domain_name(),
        )?;

        // The request budget always bounds the run, with or without a duration
        validate_positive(self.total_requests, "total_requests", self.domain_name())?;

        // Bad patterns and field paths fail here rather than per request
        CompiledExpectations::compile(&self.expectations)
    }
}

impl Validatable for StressTestConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.prepare().map(drop)
    }

    fn domain_name(&self) -> &'static str {
        "stress_test"
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses are final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one stress-test execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,

    /// `None` for scratch runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<i64>,

    pub config_name: String,
    pub request_file: String,
    pub profile_name: String,
    pub status: RunStatus,

    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    pub total_requests_sent: u64,
    pub total_requests_completed: u64,
    pub total_errors: u64,
    pub total_validation_errors: u64,

    pub avg_duration_ms: f64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    pub p50_duration_ms: u64,
    pub p95_duration_ms: u64,
    pub p99_duration_ms: u64,

    /// Completed requests per second of wall-clock time
    #[serde(default)]
    pub requests_per_second: f64,

    /// Why the run failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Run {
    /// A fresh running record for `config`
    pub fn start(config: &StressTestConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config_id: config.id,
            config_name: config.name.clone(),
            request_file: config.request_file.clone(),
            profile_name: config.profile_name.clone(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            total_requests_sent: 0,
            total_requests_completed: 0,
            total_errors: 0,
            total_validation_errors: 0,
            avg_duration_ms: 0.0,
            min_duration_ms: 0,
            max_duration_ms: 0,
            p50_duration_ms: 0,
            p95_duration_ms: 0,
            p99_duration_ms: 0,
            requests_per_second: 0.0,
            error_message: None,
        }
    }

    /// Record of a run that never started because its request could not be prepared
    pub fn preflight_failure(config: &StressTestConfig, reason: impl Into<String>) -> Self {
        let mut run = Self::start(config);
        run.status = RunStatus::Failed;
        run.completed_at = Some(run.started_at);
        run.error_message = Some(reason.into());
        run
    }

    /// Requests that completed and passed validation
    pub fn success(&self) -> u64 {
        self.total_requests_completed
            .saturating_sub(self.total_errors)
            .saturating_sub(self.total_validation_errors)
    }

    /// Share of completed requests that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_requests_completed == 0 {
            return 0.0;
        }
        self.success() as f64 * 100.0 / self.total_requests_completed as f64
    }

    pub fn is_scratch(&self) -> bool {
        self.config_id.is_none()
    }

    /// Wall-clock duration, once the run has finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }

    pub(crate) fn apply_latency(&mut self, stats: &LatencyStats) {
        self.avg_duration_ms = stats.avg_ms;
        self.min_duration_ms = stats.min_ms;
        self.max_duration_ms = stats.max_ms;
        self.p50_duration_ms = stats.p50_ms;
        self.p95_duration_ms = stats.p95_ms;
        self.p99_duration_ms = stats.p99_ms;
    }
}
