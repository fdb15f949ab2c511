//! Marker trait for records the cache can key, tag and invalidate.

use serde::{Serialize, de::DeserializeOwned};

use super::tags::Tag;

/// A record with a stable type name, an id and a set of tagging attributes.
///
/// Tagging attributes are the fields that query-scoped reads select on
/// (status, qualification, owning supplier, ...). When one of them changes,
/// cached results selected by the old and the new value both go stale, so
/// every attribute used to select a cached query must be listed here.
pub trait CacheableEntity: Serialize + DeserializeOwned + Send + Sync {
    /// Type segment used in keys and tags. Must match `[a-z0-9_-]`.
    const ENTITY_TYPE: &'static str;

    fn cache_id(&self) -> String;

    /// `(attribute, value)` pairs used for tag fan-out on writes. A
    /// multi-valued attribute appears once per value.
    fn tag_attributes(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Entity tags for every record in a result set.
pub fn entity_tags<T: CacheableEntity>(records: &[T]) -> Vec<Tag> {
    records
        .iter()
        .map(|record| Tag::entity(T::ENTITY_TYPE, &record.cache_id()))
        .collect()
}
