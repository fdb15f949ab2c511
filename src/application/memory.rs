//! In-memory service implementations.
//!
//! They stand in for the document store: records live in a `DashMap`, every
//! read is counted, and the store can be switched to fail so callers can
//! observe how errors travel through the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::application::services::{CustomerService, InspectionService, SupplierService};
use crate::domain::customers::{CustomerPatch, NewCustomer};
use crate::domain::entities::{
    CUSTOMER, CustomerRecord, INSPECTION, InspectionRecord, SUPPLIER, SupplierRecord,
};
use crate::domain::inspections::{InspectionPatch, NewInspection};
use crate::domain::suppliers::{NewSupplier, SupplierFilter, SupplierPatch};
use crate::domain::types::{CustomerStatus, InspectionStatus, QualificationType, SupplierStatus};

struct MemoryStore<T> {
    entity: &'static str,
    records: DashMap<Uuid, T>,
    reads: AtomicUsize,
    unavailable: AtomicBool,
}

impl<T: Clone> MemoryStore<T> {
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            records: DashMap::new(),
            reads: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    fn ensure_available(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::persistence(format!(
                "{} store unavailable",
                self.entity
            )));
        }
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<T, ServiceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        self.records
            .get(&id)
            .map(|record| record.value().clone())
            .ok_or_else(|| ServiceError::not_found(self.entity, id))
    }

    fn list<K: Ord>(&self, keep: impl Fn(&T) -> bool, order: impl Fn(&T) -> K) -> Result<Vec<T>, ServiceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;
        let mut records: Vec<T> = self
            .records
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| order(record));
        Ok(records)
    }

    fn insert(&self, id: Uuid, record: T) -> Result<T, ServiceError> {
        self.ensure_available()?;
        self.records.insert(id, record.clone());
        Ok(record)
    }

    /// Apply `change` to a copy and store it only if the change succeeds.
    fn modify(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut T) -> Result<(), ServiceError>,
    ) -> Result<T, ServiceError> {
        self.ensure_available()?;
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found(self.entity, id))?;
        let mut next = entry.value().clone();
        change(&mut next)?;
        *entry.value_mut() = next.clone();
        Ok(next)
    }

    fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        self.ensure_available()?;
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found(self.entity, id))
    }
}

macro_rules! store_handle {
    ($name:ident, $record:ty, $entity:expr) => {
        #[derive(Clone)]
        pub struct $name {
            store: Arc<MemoryStore<$record>>,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    store: Arc::new(MemoryStore::new($entity)),
                }
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Number of reads served by the store itself.
            pub fn reads(&self) -> usize {
                self.store.reads.load(Ordering::SeqCst)
            }

            pub fn len(&self) -> usize {
                self.store.records.len()
            }

            pub fn is_empty(&self) -> bool {
                self.store.records.is_empty()
            }

            /// Make every subsequent call fail with a persistence error.
            pub fn set_unavailable(&self, unavailable: bool) {
                self.store.unavailable.store(unavailable, Ordering::SeqCst);
            }
        }
    };
}

store_handle!(InMemorySupplierService, SupplierRecord, SUPPLIER);
store_handle!(InMemoryCustomerService, CustomerRecord, CUSTOMER);
store_handle!(InMemoryInspectionService, InspectionRecord, INSPECTION);

#[async_trait]
impl SupplierService for InMemorySupplierService {
    async fn find_by_id(&self, id: Uuid) -> Result<SupplierRecord, ServiceError> {
        self.store.get(id)
    }

    async fn find_all(&self) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.store.list(|_| true, |record| record.name.clone())
    }

    async fn search(&self, filter: &SupplierFilter) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.store
            .list(|record| filter.matches(record), |record| record.name.clone())
    }

    async fn get_by_status(
        &self,
        status: SupplierStatus,
    ) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.store
            .list(|record| record.status == status, |record| record.name.clone())
    }

    async fn find_by_qualification(
        &self,
        qualification: QualificationType,
    ) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.store.list(
            |record| record.qualifications.contains(&qualification),
            |record| record.name.clone(),
        )
    }

    async fn create(&self, input: NewSupplier) -> Result<SupplierRecord, ServiceError> {
        let id = Uuid::new_v4();
        let record = input.into_record(id, OffsetDateTime::now_utc())?;
        let duplicate = self
            .store
            .records
            .iter()
            .any(|entry| entry.value().cage_code == record.cage_code);
        if duplicate {
            return Err(ServiceError::Duplicate {
                constraint: "supplier_cage_code_key",
            });
        }
        self.store.insert(id, record)
    }

    async fn update(&self, id: Uuid, patch: SupplierPatch) -> Result<SupplierRecord, ServiceError> {
        self.store.modify(id, |record| {
            patch
                .apply(record, OffsetDateTime::now_utc())
                .map_err(ServiceError::from)
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store.remove(id)
    }
}

#[async_trait]
impl CustomerService for InMemoryCustomerService {
    async fn find_by_id(&self, id: Uuid) -> Result<CustomerRecord, ServiceError> {
        self.store.get(id)
    }

    async fn find_all(&self) -> Result<Vec<CustomerRecord>, ServiceError> {
        self.store.list(|_| true, |record| record.name.clone())
    }

    async fn get_by_status(
        &self,
        status: CustomerStatus,
    ) -> Result<Vec<CustomerRecord>, ServiceError> {
        self.store
            .list(|record| record.status == status, |record| record.name.clone())
    }

    async fn create(&self, input: NewCustomer) -> Result<CustomerRecord, ServiceError> {
        let id = Uuid::new_v4();
        let record = input.into_record(id, OffsetDateTime::now_utc())?;
        self.store.insert(id, record)
    }

    async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<CustomerRecord, ServiceError> {
        self.store.modify(id, |record| {
            patch
                .apply(record, OffsetDateTime::now_utc())
                .map_err(ServiceError::from)
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store.remove(id)
    }
}

#[async_trait]
impl InspectionService for InMemoryInspectionService {
    async fn find_by_id(&self, id: Uuid) -> Result<InspectionRecord, ServiceError> {
        self.store.get(id)
    }

    async fn find_all(&self) -> Result<Vec<InspectionRecord>, ServiceError> {
        self.store
            .list(|_| true, |record| (record.scheduled_for, record.id))
    }

    async fn find_by_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<InspectionRecord>, ServiceError> {
        self.store.list(
            |record| record.supplier_id == supplier_id,
            |record| (record.scheduled_for, record.id),
        )
    }

    async fn get_by_status(
        &self,
        status: InspectionStatus,
    ) -> Result<Vec<InspectionRecord>, ServiceError> {
        self.store.list(
            |record| record.status == status,
            |record| (record.scheduled_for, record.id),
        )
    }

    async fn create(&self, input: NewInspection) -> Result<InspectionRecord, ServiceError> {
        let id = Uuid::new_v4();
        let record = input.into_record(id, OffsetDateTime::now_utc());
        self.store.insert(id, record)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: InspectionPatch,
    ) -> Result<InspectionRecord, ServiceError> {
        self.store.modify(id, |record| {
            patch
                .apply(record, OffsetDateTime::now_utc())
                .map_err(ServiceError::from)
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store.remove(id)
    }
}
