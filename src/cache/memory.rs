//! In-process cache backend.
//!
//! Values sit in a capacity-bounded LRU with an absolute expiry per entry;
//! expired entries are dropped lazily when read. Tag sets live in a plain map
//! and are only removed through `delete_key`.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;

use super::backend::{BackendError, CacheBackend};
use super::config::CacheConfig;
use super::lock;

const OWNER: &str = "cache::memory";
const METRIC_CACHE_EVICT: &str = "aerocache_cache_evict_total";

struct StoredValue {
    payload: Bytes,
    expires_at: Instant,
}

pub struct InMemoryBackend {
    values: Mutex<LruCache<String, StoredValue>>,
    sets: RwLock<HashMap<String, HashSet<String>>>,
}

impl InMemoryBackend {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            values: Mutex::new(LruCache::new(capacity)),
            sets: RwLock::new(HashMap::new()),
        }
    }

    /// Capacity of zero is clamped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries)
    }

    /// Number of stored values, including expired ones not yet read.
    pub fn len(&self) -> usize {
        lock::exclusive(&self.values, OWNER, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-empty tag sets.
    pub fn set_count(&self) -> usize {
        lock::read(&self.sets, OWNER, "set_count").len()
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let mut values = lock::exclusive(&self.values, OWNER, "get");
        match values.get(key) {
            None => return Ok(None),
            Some(stored) if stored.expires_at > Instant::now() => {
                return Ok(Some(stored.payload.clone()));
            }
            Some(_) => {}
        }
        values.pop(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), BackendError> {
        let stored = StoredValue {
            payload: value,
            expires_at: Instant::now() + ttl,
        };
        let displaced = lock::exclusive(&self.values, OWNER, "set").push(key.to_string(), stored);
        if let Some((displaced_key, _)) = displaced
            && displaced_key != key
        {
            counter!(METRIC_CACHE_EVICT, "layer" => "memory").increment(1);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        lock::exclusive(&self.values, OWNER, "delete").pop(key);
        Ok(())
    }

    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<(), BackendError> {
        lock::write(&self.sets, OWNER, "add_to_set")
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn members_of(&self, set_key: &str) -> Result<HashSet<String>, BackendError> {
        Ok(lock::read(&self.sets, OWNER, "members_of")
            .get(set_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_key(&self, set_key: &str) -> Result<(), BackendError> {
        lock::write(&self.sets, OWNER, "delete_key").remove(set_key);
        Ok(())
    }
}
