//! Tags and the tag → keys index.
//!
//! The index lives in the shared backend (one set per tag under `tag:<tag>`),
//! so every process sees the same membership. It tolerates divergence from
//! the value space only in the safe direction: an un-indexed value lives at
//! most until its TTL, and an indexed key without a value costs a no-op delete.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::backend::{BackendError, CacheBackend, with_timeout};

const INDEX_PREFIX: &str = "tag";

/// Label shared by cache entries that must be invalidated together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    /// `entity:<type>:<id>`: attached to everything derived from one record.
    pub fn entity(entity_type: &str, id: &str) -> Self {
        Self(format!("entity:{entity_type}:{id}"))
    }

    /// `<type>:list`: swept by every write to the type.
    pub fn list(entity_type: &str) -> Self {
        Self(format!("{entity_type}:list"))
    }

    /// `<type>:<attribute>:<value>`: results selected by one attribute value.
    pub fn attribute(entity_type: &str, attribute: &str, value: &str) -> Self {
        Self(format!("{entity_type}:{attribute}:{value}"))
    }

    pub fn custom(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn index_key(&self) -> String {
        format!("{INDEX_PREFIX}:{}", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag → keys membership, stored in the cache backend.
///
/// Owned by the coordinator; nothing else mutates it.
pub struct TagIndex {
    backend: Arc<dyn CacheBackend>,
    timeout: Duration,
}

impl TagIndex {
    pub fn new(backend: Arc<dyn CacheBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Add `key` to the member set of each tag.
    pub async fn add_key_to_tags(&self, key: &str, tags: &[Tag]) -> Result<(), BackendError> {
        for tag in tags {
            with_timeout(
                self.timeout,
                "add_to_set",
                self.backend.add_to_set(&tag.index_key(), key),
            )
            .await?;
        }
        debug!(cache_key = key, tag_count = tags.len(), "Indexed cache key");
        Ok(())
    }

    /// Union of the keys currently indexed under any of `tags`.
    pub async fn keys_for_tags(&self, tags: &[Tag]) -> Result<HashSet<String>, BackendError> {
        let mut keys = HashSet::new();
        for tag in tags {
            let members = with_timeout(
                self.timeout,
                "members_of",
                self.backend.members_of(&tag.index_key()),
            )
            .await?;
            keys.extend(members);
        }
        Ok(keys)
    }

    /// Drop the member sets of `tags` entirely.
    ///
    /// Every tag is attempted; the first failure is reported.
    pub async fn clear_tags(&self, tags: &[Tag]) -> Result<(), BackendError> {
        let mut first_error = None;
        for tag in tags {
            let cleared = with_timeout(
                self.timeout,
                "delete_key",
                self.backend.delete_key(&tag.index_key()),
            )
            .await;
            if let Err(err) = cleared
                && first_error.is_none()
            {
                first_error = Some(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
