//! Command handlers
//!
//! Handlers return a [`CommandOutput`] and leave printing to the
//! [`OutputFormatter`](crate::formatter::OutputFormatter), except for the
//! live progress of `run`.

pub mod config;
pub mod run;
pub mod runs;

use anyhow::{anyhow, Result};
use barrage_config::BarrageConfig;
use barrage_engine::{Expectations, Run, StressTestConfig};
use barrage_storage::StressTestStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cli::TestArgs;

/// Result of a command, ready to be displayed
#[derive(Debug)]
pub enum CommandOutput {
    Success {
        message: String,
        data: Option<Value>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Json {
        data: Value,
    },
    Text {
        content: String,
    },
    Report {
        run: Box<Run>,
    },
}

/// Everything a command needs
pub struct AppContext {
    pub config: BarrageConfig,
    pub profile: String,
    pub store: Arc<dyn StressTestStore>,
}

/// Build a stress-test definition from command-line flags
pub fn config_from_args(args: &TestArgs, name: &str, profile: &str) -> Result<StressTestConfig> {
    let request = args
        .request
        .clone()
        .ok_or_else(|| anyhow!("--request is required unless --config names a saved config"))?;

    let mut fields = BTreeMap::new();
    for pair in &args.expect_field {
        let (path, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("--expect-field expects PATH=VALUE, got '{}'", pair))?;
        fields.insert(path.trim().to_string(), value.to_string());
    }

    let expectations = Expectations {
        expected_status_codes: args.expect_status.iter().copied().collect(),
        expected_body_exact: args.expect_body.clone(),
        expected_body_contains: args.expect_contains.clone(),
        expected_body_pattern: args.expect_pattern.clone(),
        expected_body_fields: fields,
    };

    Ok(StressTestConfig::new(args.conns, args.requests)
        .with_name(name)
        .with_profile(profile)
        .with_request_file(request)
        .with_ramp_up(args.ramp_up)
        .with_duration(args.duration)
        .with_expectations(expectations))
}

/// First eight characters of an id, enough to tell runs apart in a table
pub(crate) fn short_id(id: &uuid::Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
