//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Profile that configs and runs belong to
    #[arg(long, value_name = "NAME", global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a stress test, either ad hoc or from a saved config
    Run(RunArgs),

    /// Manage saved stress-test configs
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },

    /// Inspect past runs
    Runs {
        #[command(subcommand)]
        runs_cmd: RunsCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Name of a saved config to run
    #[arg(long, value_name = "NAME", conflicts_with = "request")]
    pub config: Option<String>,

    #[command(flatten)]
    pub test: TestArgs,

    /// Save the ad-hoc definition under this name before running
    #[arg(long, value_name = "NAME", requires = "request")]
    pub save_as: Option<String>,

    /// Print the finished run as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Stress-test definition given on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct TestArgs {
    /// Request file (YAML or JSON) to send
    #[arg(long, value_name = "PATH")]
    pub request: Option<String>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub conns: u32,

    /// Total request budget
    #[arg(long, value_name = "N", default_value_t = 100)]
    pub requests: u64,

    /// Seconds over which workers are started
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub ramp_up: u64,

    /// Wall-clock limit in seconds (0 = unlimited)
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub duration: u64,

    /// Acceptable status code; repeat for several
    #[arg(long = "expect-status", value_name = "CODE")]
    pub expect_status: Vec<u16>,

    /// Body must equal this string
    #[arg(long, value_name = "TEXT")]
    pub expect_body: Option<String>,

    /// Body must contain this string
    #[arg(long, value_name = "TEXT")]
    pub expect_contains: Option<String>,

    /// Body must match this regular expression
    #[arg(long, value_name = "REGEX")]
    pub expect_pattern: Option<String>,

    /// JSON field check as PATH=VALUE; repeat for several
    #[arg(long = "expect-field", value_name = "PATH=VALUE")]
    pub expect_field: Vec<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Save a config under a name
    Save {
        /// Config name, unique within the profile
        #[arg(long, value_name = "NAME")]
        name: String,

        #[command(flatten)]
        test: TestArgs,
    },

    /// List configs of the profile
    List,

    /// Show one config
    Show {
        name: String,

        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },

    /// Delete a config
    Delete { name: String },

    /// Print a sample engine configuration file
    Sample,
}

#[derive(Subcommand)]
pub enum RunsCommands {
    /// List recent runs of the profile, newest first
    List {
        /// Maximum number of runs to show (0 = all)
        #[arg(long, value_name = "N", default_value_t = 20)]
        limit: usize,
    },

    /// Show one run
    Show {
        id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a run
    Delete { id: String },
}
