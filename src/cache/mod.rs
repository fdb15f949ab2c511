//! Tag-indexed read-through cache.
//!
//! Layers, leaves first:
//!
//! - [`CacheBackend`]: shared key/value store with TTL and string sets
//!   ([`InMemoryBackend`] is the in-process implementation),
//! - [`keys`]: deterministic entity and query keys,
//! - [`TagIndex`]: tag → keys membership kept in the backend,
//! - [`PolicyRegistry`]: per-operation TTL, scope and default tags,
//! - [`CacheCoordinator`]: read-through and write-triggered invalidation,
//! - [`CachedService`]: the wrapper services are exposed through.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! default_ttl_seconds = 60
//! backend_timeout_ms = 250
//! max_entries = 10000
//!
//! [cache.policy_ttl_seconds.supplier]
//! find_all = 120
//! ```

mod adapter;
mod backend;
mod config;
mod coordinator;
mod entity;
pub mod keys;
mod lock;
mod memory;
mod policy;
mod tags;

pub use adapter::CachedService;
pub use backend::{BackendError, CacheBackend};
pub use config::CacheConfig;
pub use coordinator::{CacheCoordinator, InvalidationReport, WriteKind, invalidation_tags};
pub use entity::{CacheableEntity, entity_tags};
pub use keys::{KeyError, entity_key, query_key};
pub use memory::InMemoryBackend;
pub use policy::{CachePolicy, Operation, PolicyRegistry, PolicyRegistryBuilder, PolicyScope};
pub use tags::{Tag, TagIndex};
