use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every cache metric with the installed recorder.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "aerocache_cache_hit_total",
            Unit::Count,
            "Reads answered from the cache, by operation."
        );
        describe_counter!(
            "aerocache_cache_miss_total",
            Unit::Count,
            "Reads that fell through to the wrapped service, by operation."
        );
        describe_counter!(
            "aerocache_cache_backend_error_total",
            Unit::Count,
            "Failed, timed-out or undecodable cache backend calls on the read path."
        );
        describe_counter!(
            "aerocache_cache_evict_total",
            Unit::Count,
            "Entries evicted from the in-process backend due to capacity."
        );
        describe_counter!(
            "aerocache_cache_invalidated_keys_total",
            Unit::Count,
            "Cache keys deleted by invalidation sweeps."
        );
        describe_counter!(
            "aerocache_cache_invalidation_failure_total",
            Unit::Count,
            "Invalidation steps that failed and were left to TTL expiry."
        );
        describe_histogram!(
            "aerocache_cache_invalidate_ms",
            Unit::Milliseconds,
            "Invalidation sweep latency in milliseconds."
        );
    });
}
