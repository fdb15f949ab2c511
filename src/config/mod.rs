//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{collections::HashMap, num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{CliArgs, Command, GlobalOverrides, ScenarioArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "aerocache";
const ENV_PREFIX: &str = "AEROCACHE";
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_CACHE_BACKEND_TIMEOUT_MS: u64 = 250;
const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub default_ttl: Duration,
    pub backend_timeout: Duration,
    pub max_entries: NonZeroUsize,
    /// TTL overrides keyed by `<service>.<method>`.
    pub policy_ttls: HashMap<String, Duration>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

impl LoadError {
    fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(seconds) = overrides.cache_default_ttl_seconds {
            self.cache.default_ttl_seconds = Some(seconds);
        }
        if let Some(millis) = overrides.cache_backend_timeout_ms {
            self.cache.backend_timeout_ms = Some(millis);
        }
        if overrides.cache_disabled {
            self.cache.enabled = Some(false);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    default_ttl_seconds: Option<u64>,
    backend_timeout_ms: Option<u64>,
    max_entries: Option<u64>,
    /// `[cache.policy_ttl_seconds.<service>]` tables of `<method> = seconds`.
    policy_ttl_seconds: HashMap<String, HashMap<String, u64>>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, cache } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self { logging, cache })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let default_ttl = Duration::from_secs(positive(
        cache.default_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
        "cache.default_ttl_seconds",
    )?);
    let backend_timeout = Duration::from_millis(positive(
        cache
            .backend_timeout_ms
            .unwrap_or(DEFAULT_CACHE_BACKEND_TIMEOUT_MS),
        "cache.backend_timeout_ms",
    )?);

    let max_entries = cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);
    let max_entries = usize::try_from(max_entries)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            LoadError::invalid("cache.max_entries", "must be greater than zero and fit in usize")
        })?;

    let mut policy_ttls = HashMap::new();
    for (service, methods) in cache.policy_ttl_seconds {
        for (method, seconds) in methods {
            let key = format!("cache.policy_ttl_seconds.{service}.{method}");
            let seconds = positive(seconds, &key)?;
            policy_ttls.insert(format!("{service}.{method}"), Duration::from_secs(seconds));
        }
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        default_ttl,
        backend_timeout,
        max_entries,
        policy_ttls,
    })
}

fn positive(value: u64, key: &str) -> Result<u64, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests;
