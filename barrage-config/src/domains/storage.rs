//! Location and retention of saved configs and runs

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Falls back to the platform data directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    pub file_name: String,

    /// Older runs of a profile are pruned past this count
    pub max_runs_per_profile: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            file_name: "stress-tests.json".to_string(),
            max_runs_per_profile: 100,
        }
    }
}

impl StorageConfig {
    pub fn store_path(&self) -> Option<PathBuf> {
        Some(self.data_dir.as_deref()?.join(&self.file_name))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl Validatable for StorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !is_plain_file_name(&self.file_name) {
            return Err(self.validation_error(format!(
                "file_name '{}' must be a bare file name",
                self.file_name
            )));
        }
        validate_positive(
            self.max_runs_per_profile,
            "max_runs_per_profile",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "storage"
    }
}
