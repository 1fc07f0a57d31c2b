//! `barrage config` handlers

use anyhow::{bail, Context, Result};
use barrage_config::BarrageConfig;
use barrage_engine::StressTestConfig;
use barrage_storage::StressTestStore;
use tracing::info;

use super::{config_from_args, CommandOutput};
use crate::cli::TestArgs;

/// Save a config, replacing an existing one of the same name
pub async fn save(
    store: &dyn StressTestStore,
    profile: &str,
    name: &str,
    args: &TestArgs,
) -> Result<CommandOutput> {
    let mut config = config_from_args(args, name, profile)?;

    match store.get_config_by_name(profile, name).await {
        Ok(existing) => config.id = existing.id,
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e).context("Failed to look up existing config"),
    }
    let replaced = config.id.is_some();

    let saved = store
        .save_config(config)
        .await
        .with_context(|| format!("Failed to save config '{}'", name))?;
    let id = saved.id.unwrap_or_default();
    info!(config_id = id, name = %saved.name, replaced, "Config saved");

    let verb = if replaced { "Updated" } else { "Saved" };
    Ok(CommandOutput::Success {
        message: format!("{} config '{}' (id {}) in profile '{}'", verb, saved.name, id, profile),
        data: None,
    })
}

pub async fn list(store: &dyn StressTestStore, profile: &str) -> Result<CommandOutput> {
    let configs = store.list_configs(profile).await?;

    let headers = ["ID", "Name", "Conns", "Requests", "Ramp-up", "Duration", "Request file"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = configs.iter().map(config_row).collect();

    Ok(CommandOutput::Table { headers, rows })
}

fn config_row(config: &StressTestConfig) -> Vec<String> {
    let seconds = |secs: u64| {
        if secs == 0 {
            "-".to_string()
        } else {
            format!("{}s", secs)
        }
    };

    vec![
        config.id.map(|id| id.to_string()).unwrap_or_default(),
        config.name.clone(),
        config.concurrent_conns.to_string(),
        config.total_requests.to_string(),
        seconds(config.ramp_up_duration_sec),
        seconds(config.test_duration_sec),
        config.request_file.clone(),
    ]
}

pub async fn show(
    store: &dyn StressTestStore,
    profile: &str,
    name: &str,
    format: &str,
) -> Result<CommandOutput> {
    let config = store.get_config_by_name(profile, name).await?;

    match format {
        "yaml" | "yml" => Ok(CommandOutput::Text {
            content: serde_yaml::to_string(&config)?,
        }),
        "json" => Ok(CommandOutput::Json {
            data: serde_json::to_value(&config)?,
        }),
        other => bail!("Unsupported format '{}'; use yaml or json", other),
    }
}

pub async fn delete(store: &dyn StressTestStore, profile: &str, name: &str) -> Result<CommandOutput> {
    let config = store.get_config_by_name(profile, name).await?;
    let id = config
        .id
        .with_context(|| format!("Config '{}' has no id", name))?;
    store.delete_config(id).await?;

    Ok(CommandOutput::Success {
        message: format!("Deleted config '{}' (id {})", name, id),
        data: None,
    })
}

/// Sample engine configuration file
pub fn sample() -> CommandOutput {
    CommandOutput::Text {
        content: BarrageConfig::generate_sample(),
    }
}
