//! Read-through population and write-triggered invalidation.
//!
//! The coordinator is the only component that writes to the cache backend or
//! the tag index. Cache-tier failures never reach the caller: a failed or
//! slow lookup is a miss, a failed write-back is skipped and a failed
//! invalidation is logged and counted, leaving staleness bounded by TTL.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::future::join_all;
use metrics::{counter, histogram};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::backend::{BackendError, CacheBackend, with_timeout};
use super::config::CacheConfig;
use super::entity::CacheableEntity;
use super::keys::{KeyError, entity_id_from_args, entity_key, query_key};
use super::policy::{Operation, PolicyRegistry, PolicyScope};
use super::tags::{Tag, TagIndex};

const METRIC_CACHE_HIT: &str = "aerocache_cache_hit_total";
const METRIC_CACHE_MISS: &str = "aerocache_cache_miss_total";
const METRIC_CACHE_BACKEND_ERROR: &str = "aerocache_cache_backend_error_total";
const METRIC_CACHE_INVALIDATED_KEYS: &str = "aerocache_cache_invalidated_keys_total";
const METRIC_CACHE_INVALIDATION_FAILURE: &str = "aerocache_cache_invalidation_failure_total";
const METRIC_CACHE_INVALIDATE_MS: &str = "aerocache_cache_invalidate_ms";

/// The kind of mutation passed to [`CacheCoordinator::write_through`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update { id: String },
    Delete { id: String },
}

impl WriteKind {
    pub fn update(id: impl ToString) -> Self {
        Self::Update { id: id.to_string() }
    }

    pub fn delete(id: impl ToString) -> Self {
        Self::Delete { id: id.to_string() }
    }

    fn id(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Update { id } | Self::Delete { id } => Some(id),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Outcome of one invalidation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    pub keys_deleted: usize,
    pub failures: usize,
}

impl InvalidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

pub struct CacheCoordinator {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
    index: TagIndex,
    policies: PolicyRegistry,
}

impl CacheCoordinator {
    pub fn new(config: CacheConfig, backend: Arc<dyn CacheBackend>, policies: PolicyRegistry) -> Self {
        let index = TagIndex::new(backend.clone(), config.backend_timeout);
        Self {
            config,
            backend,
            index,
            policies,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Serve `operation(args)` from the cache, falling back to `fetch` on a
    /// miss and writing the result back under the operation's policy.
    ///
    /// Concurrent misses on the same key are not coalesced: each caller runs
    /// `fetch` and the last write-back wins.
    pub async fn read_through<A, T, E, F, Fut>(
        &self,
        operation: Operation,
        args: &A,
        tags: Vec<Tag>,
        fetch: F,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<KeyError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.read_through_with(operation, args, tags, fetch, |_| Vec::new())
            .await
    }

    /// [`read_through`](Self::read_through) with extra tags derived from the
    /// fetched value, typically the entity tags of every record in a list.
    pub async fn read_through_with<A, T, E, F, Fut, M>(
        &self,
        operation: Operation,
        args: &A,
        tags: Vec<Tag>,
        fetch: F,
        member_tags: M,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<KeyError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        M: FnOnce(&T) -> Vec<Tag>,
    {
        if !self.config.enabled {
            return fetch().await;
        }

        let policy = self.policies.policy_for(&operation);
        let (key, mut entry_tags) = match policy.scope {
            PolicyScope::Entity { entity_type } => {
                let id = entity_id_from_args(&operation.to_string(), args)?;
                let key = entity_key(entity_type, &id)?;
                let mut entry_tags = vec![Tag::entity(entity_type, &id)];
                entry_tags.extend(tags);
                (key, entry_tags)
            }
            PolicyScope::Query => (query_key(operation.service, operation.method, args)?, tags),
        };
        entry_tags.extend(policy.default_tags.iter().cloned());

        if let Some(value) = self.lookup::<T>(operation, &key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        entry_tags.extend(member_tags(&value));
        entry_tags.sort();
        entry_tags.dedup();
        self.write_back(operation, &key, &value, policy.ttl, &entry_tags)
            .await;
        Ok(value)
    }

    /// Run `mutation`, then invalidate everything the change can make stale.
    ///
    /// `before` is the record as read before the mutation (`None` on create
    /// or when it could not be read); `project` picks the record out of the
    /// mutation result (`None` for deletes). The entity's own key is deleted
    /// directly as well as through the tag index. Invalidation failures are
    /// logged and never fail the write.
    pub async fn write_through<T, R, E, Fut, P>(
        &self,
        kind: WriteKind,
        before: Option<&T>,
        mutation: Fut,
        project: P,
    ) -> Result<R, E>
    where
        T: CacheableEntity,
        Fut: Future<Output = Result<R, E>>,
        P: FnOnce(&R) -> Option<&T>,
    {
        let result = mutation.await?;
        if !self.config.enabled {
            return Ok(result);
        }

        let after = project(&result);
        let id = kind
            .id()
            .map(str::to_owned)
            .or_else(|| after.map(|record| record.cache_id()));
        if id.is_none() {
            warn!(
                entity_type = T::ENTITY_TYPE,
                write = kind.as_str(),
                "Write produced no entity id; sweeping list and attribute tags only"
            );
        }

        let tags = invalidation_tags(id.as_deref(), before, after);
        let mut report = self.invalidate_by_tags(&tags).await;
        if let Some(id) = id.as_deref() {
            self.delete_entity_key(T::ENTITY_TYPE, id, &mut report).await;
        }
        debug!(
            entity_type = T::ENTITY_TYPE,
            entity_id = id.as_deref().unwrap_or(""),
            write = kind.as_str(),
            keys_deleted = report.keys_deleted,
            failures = report.failures,
            "Write-through invalidation finished"
        );
        Ok(result)
    }

    /// Delete every key indexed under any of `tags`, then drop the tag sets.
    ///
    /// Repeating a sweep is a no-op. Index membership is kept when the key
    /// lookup itself fails so a later sweep can still reach those keys.
    #[instrument(skip_all, fields(tag_count = tags.len()))]
    pub async fn invalidate_by_tags(&self, tags: &[Tag]) -> InvalidationReport {
        let mut report = InvalidationReport::default();
        if tags.is_empty() {
            return report;
        }
        let started_at = Instant::now();

        let keys = match self.index.keys_for_tags(tags).await {
            Ok(keys) => keys,
            Err(err) => {
                report.failures += 1;
                self.record_invalidation_failure("members_of", &err);
                self.finish_sweep(tags, &report, started_at);
                return report;
            }
        };

        let deletes = keys.iter().map(|key| {
            with_timeout(
                self.config.backend_timeout,
                "delete",
                self.backend.delete(key),
            )
        });
        for (key, outcome) in keys.iter().zip(join_all(deletes).await) {
            match outcome {
                Ok(()) => report.keys_deleted += 1,
                Err(err) => {
                    report.failures += 1;
                    debug!(cache_key = %key, error = %err, "Cache key delete failed");
                    self.record_invalidation_failure("delete", &err);
                }
            }
        }

        if let Err(err) = self.index.clear_tags(tags).await {
            report.failures += 1;
            self.record_invalidation_failure("delete_key", &err);
        }

        self.finish_sweep(tags, &report, started_at);
        report
    }

    /// Sweep everything derived from one record, including its own entry
    /// when the index no longer reaches it.
    pub async fn invalidate_entity(&self, entity_type: &str, id: &str) -> InvalidationReport {
        let mut report = self
            .invalidate_by_tags(&[Tag::entity(entity_type, id)])
            .await;
        self.delete_entity_key(entity_type, id, &mut report).await;
        report
    }

    async fn delete_entity_key(&self, entity_type: &str, id: &str, report: &mut InvalidationReport) {
        let key = match entity_key(entity_type, id) {
            Ok(key) => key,
            Err(err) => {
                report.failures += 1;
                counter!(METRIC_CACHE_INVALIDATION_FAILURE, "call" => "entity_key").increment(1);
                warn!(entity_type, entity_id = id, error = %err, "Cannot derive entity cache key; entry expires by TTL");
                return;
            }
        };

        let deleted = with_timeout(
            self.config.backend_timeout,
            "delete",
            self.backend.delete(&key),
        )
        .await;
        if let Err(err) = deleted {
            report.failures += 1;
            debug!(cache_key = %key, error = %err, "Entity key delete failed");
            self.record_invalidation_failure("delete", &err);
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, operation: Operation, key: &str) -> Option<T> {
        let label = operation.to_string();
        let fetched = with_timeout(self.config.backend_timeout, "get", self.backend.get(key)).await;
        let payload = match fetched {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "operation" => label).increment(1);
                debug!(operation = %operation, cache_key = key, "Cache miss");
                return None;
            }
            Err(err) => {
                self.record_backend_error(&label, "get", &err);
                counter!(METRIC_CACHE_MISS, "operation" => label).increment(1);
                return None;
            }
        };

        match serde_json::from_slice(&payload) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "operation" => label).increment(1);
                debug!(operation = %operation, cache_key = key, "Cache hit");
                Some(value)
            }
            Err(err) => {
                counter!(METRIC_CACHE_BACKEND_ERROR, "operation" => label.clone(), "call" => "decode")
                    .increment(1);
                counter!(METRIC_CACHE_MISS, "operation" => label).increment(1);
                warn!(
                    operation = %operation,
                    cache_key = key,
                    error = %err,
                    "Discarding undecodable cache entry"
                );
                None
            }
        }
    }

    async fn write_back<T: Serialize>(
        &self,
        operation: Operation,
        key: &str,
        value: &T,
        ttl: Duration,
        tags: &[Tag],
    ) {
        let label = operation.to_string();
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                counter!(METRIC_CACHE_BACKEND_ERROR, "operation" => label, "call" => "encode")
                    .increment(1);
                warn!(operation = %operation, cache_key = key, error = %err, "Skipping write-back of unencodable value");
                return;
            }
        };

        let stored = with_timeout(
            self.config.backend_timeout,
            "set",
            self.backend.set(key, payload, ttl),
        )
        .await;
        if let Err(err) = stored {
            self.record_backend_error(&label, "set", &err);
            return;
        }

        if let Err(err) = self.index.add_key_to_tags(key, tags).await {
            self.record_backend_error(&label, "add_to_set", &err);
            // An unindexed entry would be invisible to invalidation.
            let removed = with_timeout(
                self.config.backend_timeout,
                "delete",
                self.backend.delete(key),
            )
            .await;
            if let Err(err) = removed {
                self.record_backend_error(&label, "delete", &err);
            }
            return;
        }

        debug!(
            operation = %operation,
            cache_key = key,
            tag_count = tags.len(),
            ttl_secs = ttl.as_secs(),
            "Cache write-back"
        );
    }

    fn record_backend_error(&self, operation: &str, call: &'static str, err: &BackendError) {
        counter!(
            METRIC_CACHE_BACKEND_ERROR,
            "operation" => operation.to_string(),
            "call" => call
        )
        .increment(1);
        warn!(operation, call, error = %err, "Cache backend call failed");
    }

    fn record_invalidation_failure(&self, call: &'static str, err: &BackendError) {
        counter!(METRIC_CACHE_INVALIDATION_FAILURE, "call" => call).increment(1);
        warn!(call, error = %err, "Cache invalidation step failed; entries expire by TTL");
    }

    fn finish_sweep(&self, tags: &[Tag], report: &InvalidationReport, started_at: Instant) {
        counter!(METRIC_CACHE_INVALIDATED_KEYS).increment(report.keys_deleted as u64);
        histogram!(METRIC_CACHE_INVALIDATE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        info!(
            tags = ?tags.iter().map(Tag::as_str).collect::<Vec<_>>(),
            keys_deleted = report.keys_deleted,
            failures = report.failures,
            "Cache invalidation complete"
        );
    }
}

/// Tags a write to one record must sweep.
///
/// Always the type's list tag, plus the entity tag when the id is known, plus
/// every `<type>:<attr>:<value>` tag that holds on only one side of the
/// change. For a single-valued attribute that is both the old and the new
/// value; a record that is created or deleted sweeps all of its attributes.
pub fn invalidation_tags<T: CacheableEntity>(
    id: Option<&str>,
    before: Option<&T>,
    after: Option<&T>,
) -> Vec<Tag> {
    let mut tags = BTreeSet::new();
    tags.insert(Tag::list(T::ENTITY_TYPE));
    if let Some(id) = id {
        tags.insert(Tag::entity(T::ENTITY_TYPE, id));
    }

    let attributes = |record: Option<&T>| -> BTreeSet<(&'static str, String)> {
        record
            .map(|record| record.tag_attributes().into_iter().collect())
            .unwrap_or_default()
    };
    let old = attributes(before);
    let new = attributes(after);

    for (attribute, value) in old.symmetric_difference(&new) {
        tags.insert(Tag::attribute(T::ENTITY_TYPE, attribute, value));
    }

    tags.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::cache::memory::InMemoryBackend;
    use crate::cache::policy::CachePolicy;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: u32,
        colour: String,
        size: String,
    }

    impl CacheableEntity for Widget {
        const ENTITY_TYPE: &'static str = "widget";

        fn cache_id(&self) -> String {
            self.id.to_string()
        }

        fn tag_attributes(&self) -> Vec<(&'static str, String)> {
            vec![("colour", self.colour.clone()), ("size", self.size.clone())]
        }
    }

    fn widget(id: u32, colour: &str) -> Widget {
        Widget {
            id,
            colour: colour.to_string(),
            size: "m".to_string(),
        }
    }

    #[derive(Debug)]
    enum TestError {
        Key,
        Fetch,
    }

    impl From<KeyError> for TestError {
        fn from(_: KeyError) -> Self {
            Self::Key
        }
    }

    const FIND: Operation = Operation::new("widget", "find_by_id");
    const BY_COLOUR: Operation = Operation::new("widget", "by_colour");

    fn coordinator() -> (Arc<InMemoryBackend>, CacheCoordinator) {
        let backend = Arc::new(InMemoryBackend::with_capacity(64));
        let policies = PolicyRegistry::builder()
            .register(FIND, CachePolicy::entity("widget", Duration::from_secs(60)))
            .register(
                BY_COLOUR,
                CachePolicy::query(Duration::from_secs(30)).with_default_tag(Tag::list("widget")),
            )
            .build()
            .expect("registry");
        let coordinator = CacheCoordinator::new(CacheConfig::default(), backend.clone(), policies);
        (backend, coordinator)
    }

    #[test]
    fn status_change_sweeps_old_and_new_attribute_tags() {
        let before = widget(1, "red");
        let after = widget(1, "blue");

        let tags = invalidation_tags(Some("1"), Some(&before), Some(&after));
        let names: Vec<&str> = tags.iter().map(Tag::as_str).collect();

        assert!(names.contains(&"entity:widget:1"));
        assert!(names.contains(&"widget:list"));
        assert!(names.contains(&"widget:colour:red"));
        assert!(names.contains(&"widget:colour:blue"));
        assert!(!names.iter().any(|name| name.starts_with("widget:size:")));
    }

    #[test]
    fn create_and_delete_sweep_every_attribute() {
        let record = widget(2, "red");

        let created = invalidation_tags(None, None, Some(&record));
        assert!(created.contains(&Tag::attribute("widget", "colour", "red")));
        assert!(created.contains(&Tag::attribute("widget", "size", "m")));
        assert!(!created.iter().any(|tag| tag.as_str().starts_with("entity:")));

        let deleted = invalidation_tags(Some("2"), Some(&record), None);
        assert!(deleted.contains(&Tag::entity("widget", "2")));
        assert!(deleted.contains(&Tag::attribute("widget", "colour", "red")));
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let (_, coordinator) = coordinator();
        let mut fetches = 0;

        for _ in 0..2 {
            let value: Result<Widget, TestError> = coordinator
                .read_through(FIND, &1, Vec::new(), || {
                    fetches += 1;
                    async { Ok(widget(1, "red")) }
                })
                .await;
            assert_eq!(value.expect("value"), widget(1, "red"));
        }

        assert_eq!(fetches, 1);
    }

    #[tokio::test]
    async fn fetch_errors_are_not_cached() {
        let (backend, coordinator) = coordinator();

        let failed: Result<Widget, TestError> = coordinator
            .read_through(FIND, &1, Vec::new(), || async { Err(TestError::Fetch) })
            .await;
        assert!(matches!(failed, Err(TestError::Fetch)));
        assert!(backend.is_empty());

        let recovered: Result<Widget, TestError> = coordinator
            .read_through(FIND, &1, Vec::new(), || async { Ok(widget(1, "red")) })
            .await;
        assert!(recovered.is_ok());
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn non_scalar_entity_id_is_a_key_error() {
        let (_, coordinator) = coordinator();

        let result: Result<Widget, TestError> = coordinator
            .read_through(FIND, &[1, 2], Vec::new(), || async { Ok(widget(1, "red")) })
            .await;
        assert!(matches!(result, Err(TestError::Key)));
    }

    #[tokio::test]
    async fn entries_are_indexed_under_scope_caller_and_default_tags() {
        let (backend, coordinator) = coordinator();

        let _: Result<Widget, TestError> = coordinator
            .read_through(FIND, &"7", Vec::new(), || async { Ok(widget(7, "red")) })
            .await;
        let _: Result<Vec<Widget>, TestError> = coordinator
            .read_through(
                BY_COLOUR,
                &"red",
                vec![Tag::attribute("widget", "colour", "red")],
                || async { Ok(vec![widget(7, "red")]) },
            )
            .await;

        let entity_members = backend
            .members_of("tag:entity:widget:7")
            .await
            .expect("members");
        assert!(entity_members.contains("entity:widget:7"));

        let colour_members = backend
            .members_of("tag:widget:colour:red")
            .await
            .expect("members");
        assert_eq!(colour_members.len(), 1);
        let list_members = backend.members_of("tag:widget:list").await.expect("members");
        assert_eq!(list_members, colour_members);
    }

    #[tokio::test]
    async fn invalidate_by_tags_is_idempotent() {
        let (backend, coordinator) = coordinator();
        let _: Result<Widget, TestError> = coordinator
            .read_through(FIND, &1, Vec::new(), || async { Ok(widget(1, "red")) })
            .await;

        let first = coordinator.invalidate_entity("widget", "1").await;
        assert_eq!(first.keys_deleted, 1);
        assert!(first.is_clean());
        assert!(backend.is_empty());

        let second = coordinator.invalidate_entity("widget", "1").await;
        assert_eq!(second, InvalidationReport::default());
    }

    #[tokio::test]
    async fn write_through_clears_stale_entries() {
        let (_, coordinator) = coordinator();
        let _: Result<Widget, TestError> = coordinator
            .read_through(FIND, &1, Vec::new(), || async { Ok(widget(1, "red")) })
            .await;

        let before = widget(1, "red");
        let updated: Result<Widget, TestError> = coordinator
            .write_through(
                WriteKind::update(1),
                Some(&before),
                async { Ok(widget(1, "blue")) },
                |record| Some(record),
            )
            .await;
        assert_eq!(updated.expect("updated").colour, "blue");

        let reread: Result<Widget, TestError> = coordinator
            .read_through(FIND, &1, Vec::new(), || async { Ok(widget(1, "blue")) })
            .await;
        assert_eq!(reread.expect("reread").colour, "blue");
    }

    #[tokio::test]
    async fn write_through_deletes_unindexed_entity_entry() {
        let (backend, coordinator) = coordinator();
        let payload = serde_json::to_vec(&widget(1, "red")).expect("encode");
        backend
            .set("entity:widget:1", Bytes::from(payload), Duration::from_secs(60))
            .await
            .expect("set");
        assert!(backend.members_of("tag:entity:widget:1").await.expect("members").is_empty());

        let before = widget(1, "red");
        let updated: Result<Widget, TestError> = coordinator
            .write_through(
                WriteKind::update(1),
                Some(&before),
                async { Ok(widget(1, "blue")) },
                |record| Some(record),
            )
            .await;
        assert!(updated.is_ok());
        assert!(backend.get("entity:widget:1").await.expect("get").is_none());

        backend
            .set("entity:widget:2", Bytes::from_static(b"{}"), Duration::from_secs(60))
            .await
            .expect("set");
        let report = coordinator.invalidate_entity("widget", "2").await;
        assert!(report.is_clean());
        assert!(backend.get("entity:widget:2").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn failed_mutation_skips_invalidation() {
        let (backend, coordinator) = coordinator();
        let _: Result<Widget, TestError> = coordinator
            .read_through(FIND, &1, Vec::new(), || async { Ok(widget(1, "red")) })
            .await;

        let result: Result<Widget, TestError> = coordinator
            .write_through(
                WriteKind::update(1),
                None::<&Widget>,
                async { Err(TestError::Fetch) },
                |record| Some(record),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn disabled_cache_always_fetches() {
        let backend = Arc::new(InMemoryBackend::with_capacity(8));
        let policies = PolicyRegistry::builder().build().expect("registry");
        let coordinator = CacheCoordinator::new(CacheConfig::disabled(), backend.clone(), policies);
        let mut fetches = 0;

        for _ in 0..3 {
            let _: Result<u32, TestError> = coordinator
                .read_through(BY_COLOUR, &"red", Vec::new(), || {
                    fetches += 1;
                    async { Ok(1) }
                })
                .await;
        }

        assert_eq!(fetches, 3);
        assert!(backend.is_empty());
    }
}
