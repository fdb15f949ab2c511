//! Cache configuration.
//!
//! Resolved from the `[cache]` section of `aerocache.toml` (see
//! `crate::config`).

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 60;
const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 250;
const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every read goes to the wrapped service and writes skip
    /// invalidation.
    pub enabled: bool,
    /// TTL of the fallback policy for unregistered operations.
    pub default_ttl: Duration,
    /// Upper bound for any single backend call.
    pub backend_timeout: Duration,
    /// Capacity of the in-process backend.
    pub max_entries: NonZeroUsize,
    /// Per-operation TTL overrides keyed by `<service>.<method>`.
    pub policy_ttls: HashMap<String, Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            backend_timeout: Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS),
            max_entries: NonZeroUsize::new(DEFAULT_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN),
            policy_ttls: HashMap::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl: settings.default_ttl,
            backend_timeout: settings.backend_timeout,
            max_entries: settings.max_entries,
            policy_ttls: settings.policy_ttls.clone(),
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn with_policy_ttl(mut self, operation: impl Into<String>, ttl: Duration) -> Self {
        self.policy_ttls.insert(operation.into(), ttl);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.default_ttl, Duration::from_secs(60));
        assert_eq!(config.backend_timeout, Duration::from_millis(250));
        assert_eq!(config.max_entries.get(), 10_000);
        assert!(config.policy_ttls.is_empty());
    }

    #[test]
    fn builders_override_fields() {
        let config = CacheConfig::disabled()
            .with_default_ttl(Duration::from_secs(5))
            .with_backend_timeout(Duration::from_millis(10))
            .with_policy_ttl("supplier.find_all", Duration::from_secs(300));

        assert!(!config.enabled);
        assert_eq!(config.default_ttl, Duration::from_secs(5));
        assert_eq!(config.backend_timeout, Duration::from_millis(10));
        assert_eq!(
            config.policy_ttls.get("supplier.find_all"),
            Some(&Duration::from_secs(300))
        );
    }
}
