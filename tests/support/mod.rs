//! Shared fixtures for the cache integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use aerocache::application::memory::{
    InMemoryCustomerService, InMemoryInspectionService, InMemorySupplierService,
};
use aerocache::application::policies;
use aerocache::cache::{
    BackendError, CacheBackend, CacheConfig, CacheCoordinator, CachedService, InMemoryBackend,
};
use aerocache::domain::customers::NewCustomer;
use aerocache::domain::suppliers::NewSupplier;
use aerocache::domain::types::{CustomerStatus, QualificationType, SupplierStatus};
use async_trait::async_trait;
use bytes::Bytes;

/// In-process backend with switchable faults.
pub struct FaultyBackend {
    inner: InMemoryBackend,
    fail_reads: AtomicBool,
    fail_invalidation: AtomicBool,
    fail_indexing: AtomicBool,
    get_delay_ms: AtomicU64,
}

impl FaultyBackend {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: InMemoryBackend::with_capacity(capacity),
            fail_reads: AtomicBool::new(false),
            fail_invalidation: AtomicBool::new(false),
            fail_indexing: AtomicBool::new(false),
            get_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail `delete`, `members_of` and `delete_key`.
    pub fn fail_invalidation(&self, fail: bool) {
        self.fail_invalidation.store(fail, Ordering::SeqCst);
    }

    /// Fail `add_to_set`.
    pub fn fail_indexing(&self, fail: bool) {
        self.fail_indexing.store(fail, Ordering::SeqCst);
    }

    pub fn delay_reads(&self, delay: Duration) {
        self.get_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn invalidation_guard(&self) -> Result<(), BackendError> {
        if self.fail_invalidation.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("injected invalidation failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for FaultyBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let delay = self.get_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("injected read failure"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), BackendError> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.invalidation_guard()?;
        self.inner.delete(key).await
    }

    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<(), BackendError> {
        if self.fail_indexing.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("injected indexing failure"));
        }
        self.inner.add_to_set(set_key, member).await
    }

    async fn members_of(&self, set_key: &str) -> Result<HashSet<String>, BackendError> {
        self.invalidation_guard()?;
        self.inner.members_of(set_key).await
    }

    async fn delete_key(&self, set_key: &str) -> Result<(), BackendError> {
        self.invalidation_guard()?;
        self.inner.delete_key(set_key).await
    }
}

pub fn coordinator(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Arc<CacheCoordinator> {
    let registry = policies::registry(&config).expect("policy registry");
    Arc::new(CacheCoordinator::new(config, backend, registry))
}

pub struct Harness {
    pub backend: Arc<FaultyBackend>,
    pub coordinator: Arc<CacheCoordinator>,
    pub supplier_store: InMemorySupplierService,
    pub suppliers: CachedService<InMemorySupplierService>,
    pub customer_store: InMemoryCustomerService,
    pub customers: CachedService<InMemoryCustomerService>,
    pub inspection_store: InMemoryInspectionService,
    pub inspections: CachedService<InMemoryInspectionService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let backend = Arc::new(FaultyBackend::new(config.max_entries.get()));
        let coordinator = coordinator(config, backend.clone());
        let supplier_store = InMemorySupplierService::new();
        let customer_store = InMemoryCustomerService::new();
        let inspection_store = InMemoryInspectionService::new();
        Self {
            suppliers: CachedService::new(supplier_store.clone(), coordinator.clone()),
            customers: CachedService::new(customer_store.clone(), coordinator.clone()),
            inspections: CachedService::new(inspection_store.clone(), coordinator.clone()),
            backend,
            coordinator,
            supplier_store,
            customer_store,
            inspection_store,
        }
    }
}

pub fn new_supplier(name: &str, cage_code: &str, status: SupplierStatus) -> NewSupplier {
    NewSupplier {
        name: name.to_string(),
        cage_code: cage_code.to_string(),
        country: "US".to_string(),
        status,
        qualifications: BTreeSet::from([QualificationType::As9100]),
    }
}

pub fn new_customer(name: &str, status: CustomerStatus) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        region: "EMEA".to_string(),
        status,
    }
}
