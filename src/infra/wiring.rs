//! Construction of the shared cache coordinator from settings.

use std::sync::Arc;

use tracing::info;

use crate::application::policies;
use crate::cache::{CacheConfig, CacheCoordinator, InMemoryBackend, KeyError};
use crate::config::CacheSettings;

/// Build the single coordinator every cached service shares.
pub fn build_coordinator(settings: &CacheSettings) -> Result<Arc<CacheCoordinator>, KeyError> {
    let config = CacheConfig::from(settings);
    let registry = policies::registry(&config)?;
    let backend = Arc::new(InMemoryBackend::from_config(&config));

    info!(
        enabled = config.enabled,
        policies = registry.len(),
        default_ttl_secs = config.default_ttl.as_secs(),
        max_entries = config.max_entries.get(),
        "Cache coordinator ready"
    );

    Ok(Arc::new(CacheCoordinator::new(config, backend, registry)))
}
