use anyhow::{Context, Result};
use barrage_config::domains::logging::LogLevel;
use barrage_config::{BarrageConfig, ConfigLoader};
use barrage_engine::RunStatus;
use barrage_http::{HttpConfig, HttpManager};
use barrage_logging::init_logging_from_config;
use barrage_storage::JsonFileStore;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod cli;
mod commands;
mod formatter;

use cli::{Cli, Commands, ConfigCommands, RunsCommands};
use commands::AppContext;
use formatter::OutputFormatter;

/// Exit code of a run stopped by the user
const EXIT_CANCELLED: u8 = 130;

/// Load configuration from file and environment
fn load_config(config_path: Option<&Path>) -> Result<BarrageConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) if path.exists() => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path)),
        Some(path) => {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("barrage")
}

async fn dispatch(cli: Cli, ctx: AppContext, formatter: &OutputFormatter) -> Result<ExitCode> {
    let store = ctx.store.as_ref();
    let profile = ctx.profile.as_str();

    let output = match cli.command {
        Commands::Run(args) => {
            let http = HttpConfig::from(ctx.config.http.clone())
                .with_max_timeout(ctx.config.execution.max_request_timeout);
            let client = HttpManager::with_config(http).context("Failed to create HTTP client")?;

            let run = commands::run::execute(&ctx, &args, Arc::new(client), formatter).await?;
            if args.json {
                formatter.print_json(&serde_json::to_value(&run)?);
            } else {
                formatter.print_run_report(&run);
                if run.status == RunStatus::Cancelled {
                    formatter.print_warning("Run was stopped early; partial results were saved");
                }
            }

            return Ok(match run.status {
                RunStatus::Completed | RunStatus::Running => ExitCode::SUCCESS,
                RunStatus::Cancelled => ExitCode::from(EXIT_CANCELLED),
                RunStatus::Failed => ExitCode::FAILURE,
            });
        }
        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Save { name, test } => {
                commands::config::save(store, profile, &name, &test).await?
            }
            ConfigCommands::List => commands::config::list(store, profile).await?,
            ConfigCommands::Show { name, format } => {
                commands::config::show(store, profile, &name, &format).await?
            }
            ConfigCommands::Delete { name } => commands::config::delete(store, profile, &name).await?,
            ConfigCommands::Sample => commands::config::sample(),
        },
        Commands::Runs { runs_cmd } => match runs_cmd {
            RunsCommands::List { limit } => commands::runs::list(store, profile, limit).await?,
            RunsCommands::Show { id, json } => commands::runs::show(store, &id, json).await?,
            RunsCommands::Delete { id } => commands::runs::delete(store, &id).await?,
        },
    };

    formatter.display(output);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new();

    match run_cli(cli, &formatter).await {
        Ok(code) => code,
        Err(e) => {
            formatter.print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli, formatter: &OutputFormatter) -> Result<ExitCode> {
    let mut config = load_config(cli.config_file.as_deref())?;

    if let Some(ref level) = cli.log_level {
        config.logging.level = LogLevel::from_str(level).map_err(anyhow::Error::msg)?;
    }
    let _logging = init_logging_from_config(&config.logging)?;
    debug!(
        max_concurrent_conns = config.execution.max_concurrent_conns,
        default_profile = %config.execution.default_profile,
        "Configuration loaded"
    );

    // `config sample` must work even when no store can be opened
    if matches!(
        cli.command,
        Commands::Config {
            config_cmd: ConfigCommands::Sample
        }
    ) {
        formatter.display(commands::config::sample());
        return Ok(ExitCode::SUCCESS);
    }

    let profile = cli
        .profile
        .clone()
        .unwrap_or_else(|| config.execution.default_profile.clone());
    let store = JsonFileStore::from_config(&config.storage, &default_data_dir())
        .await
        .context("Failed to open the stress-test store")?;
    info!(profile = %profile, store = %store.path().display(), "barrage starting");

    let ctx = AppContext {
        config,
        profile,
        store: Arc::new(store),
    };
    dispatch(cli, ctx, formatter).await
}
