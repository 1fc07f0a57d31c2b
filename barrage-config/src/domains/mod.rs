//! Settings grouped by the part of the system they tune

pub mod execution;
pub mod http;
pub mod logging;
pub mod storage;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

const SAMPLE_HEADER: &str = "\
# barrage settings
#
# Every key is optional. Durations take a bare number in the field's unit
# (seconds, or milliseconds for progress_interval) or a suffixed value such
# as 250ms, 30s or 2m. BARRAGE_* environment variables override this file.
";

/// All settings of one barrage installation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrageConfig {
    pub execution: execution::ExecutionConfig,
    pub http: http::HttpConfig,
    pub logging: logging::LoggingConfig,
    pub storage: storage::StorageConfig,
}

impl BarrageConfig {
    /// Validate every section, stopping at the first problem
    pub fn validate_all(&self) -> ConfigResult<()> {
        let sections: [&dyn ValidateSection; 4] =
            [&self.execution, &self.http, &self.logging, &self.storage];
        sections.iter().try_for_each(|s| s.check())
    }

    /// Defaults rendered as a commented YAML file
    pub fn generate_sample() -> String {
        match serde_yaml::to_string(&Self::default()) {
            Ok(body) => format!("{}\n{}", SAMPLE_HEADER, body),
            Err(e) => format!("# cannot render sample settings: {}\n", e),
        }
    }
}

// `Validatable` is not object safe, so sections go through this shim
trait ValidateSection {
    fn check(&self) -> ConfigResult<()>;
}

impl<T: Validatable> ValidateSection for T {
    fn check(&self) -> ConfigResult<()> {
        self.validate()
    }
}
