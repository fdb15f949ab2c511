use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the aerocache binary.
#[derive(Debug, Parser)]
#[command(
    name = "aerocache",
    version,
    about = "Tag-indexed read-through cache for supply-chain services"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "AEROCACHE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the registered cache policies after configuration is applied.
    Policies,
    /// Run the supplier status walkthrough against the in-process backend.
    Scenario(ScenarioArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ScenarioArgs {
    /// Print the step report as JSON instead of plain lines.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the TTL applied to operations without their own policy.
    #[arg(long = "cache-default-ttl-seconds", value_name = "SECONDS", global = true)]
    pub cache_default_ttl_seconds: Option<u64>,

    /// Override the per-call cache backend timeout.
    #[arg(long = "cache-backend-timeout-ms", value_name = "MILLIS", global = true)]
    pub cache_backend_timeout_ms: Option<u64>,

    /// Bypass the cache: every read goes to the wrapped service.
    #[arg(long = "cache-disabled", action = clap::ArgAction::SetTrue, global = true)]
    pub cache_disabled: bool,
}
