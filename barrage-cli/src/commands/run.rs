//! `barrage run`: execute one stress test with live progress

use anyhow::{Context, Result};
use barrage_engine::{EngineError, Executor, Run, StressTestConfig};
use barrage_http::{load_request_file, RequestExecutor};
use barrage_storage::StressTestStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{config_from_args, AppContext};
use crate::cli::RunArgs;
use crate::formatter::OutputFormatter;

/// Progress is never polled faster than this
const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(10);

/// Pick the config to run: a saved one by name, or one built from flags
pub async fn resolve_config(
    store: &dyn StressTestStore,
    profile: &str,
    args: &RunArgs,
) -> Result<StressTestConfig> {
    if let Some(ref name) = args.config {
        return store
            .get_config_by_name(profile, name)
            .await
            .with_context(|| format!("Failed to load config '{}'", name));
    }

    let name = args.save_as.as_deref().unwrap_or_default();
    let config = config_from_args(&args.test, name, profile)?;
    if args.save_as.is_none() {
        return Ok(config);
    }

    let saved = store
        .save_config(config)
        .await
        .with_context(|| format!("Failed to save config '{}'", name))?;
    info!(config_id = ?saved.id, name = %saved.name, "Saved ad-hoc config");
    Ok(saved)
}

/// Persist a run that could not start and hand it back
async fn preflight_failure(
    store: &dyn StressTestStore,
    config: &StressTestConfig,
    reason: String,
) -> Run {
    warn!(request_file = %config.request_file, "Stress test not started: {}", reason);
    let run = Run::preflight_failure(config, reason);
    if let Err(e) = store.save_run(run.clone()).await {
        warn!("Failed to record run {}: {}", run.id, e);
    }
    run
}

/// Resolve, execute, persist and report one stress test
///
/// Ctrl-C stops the run; the partial results are still saved.
pub async fn execute(
    ctx: &AppContext,
    args: &RunArgs,
    client: Arc<dyn RequestExecutor>,
    formatter: &OutputFormatter,
) -> Result<Run> {
    let store = ctx.store.as_ref();
    let config = resolve_config(store, &ctx.profile, args).await?;

    let request = match load_request_file(&config.request_file) {
        Ok(request) => request,
        Err(e) => {
            let reason = format!("cannot load request file '{}': {}", config.request_file, e);
            return Ok(preflight_failure(store, &config, reason).await);
        }
    };

    let executor = Executor::with_settings(client, ctx.config.execution.clone());
    match executor.start(&config, request) {
        Ok(_) => {}
        Err(EngineError::InvalidRequest(e)) => {
            let reason = format!("invalid request in '{}': {}", config.request_file, e);
            return Ok(preflight_failure(store, &config, reason).await);
        }
        Err(e) => return Err(e).context("Failed to start stress test"),
    }

    let stopper = executor.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping workers");
            stopper.stop();
        }
    });

    let show_progress = !args.json;
    let interval = ctx.config.execution.progress_interval.max(MIN_PROGRESS_INTERVAL);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let progress = executor.snapshot();
        if show_progress {
            formatter.print_progress(&progress);
        }
        if progress.finished {
            break;
        }
    }

    let result = executor.wait().await;
    interrupt.abort();
    formatter.clear_progress();
    let run = result?;

    store
        .save_run(run.clone())
        .await
        .with_context(|| format!("Failed to save run {}", run.id))?;

    Ok(run)
}
