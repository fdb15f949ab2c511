//! Cached implementations of the service traits.
//!
//! Reads go through the coordinator's read path with the tags named in
//! `policies`; writes read the current record first (through the cache),
//! run the mutation on the wrapped service and let the coordinator sweep
//! whatever the change can make stale. Errors from the wrapped service are
//! returned as-is and never cached.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::application::policies::{
    CUSTOMER_FIND_ALL, CUSTOMER_FIND_BY_ID, CUSTOMER_GET_BY_STATUS, INSPECTION_FIND_ALL,
    INSPECTION_FIND_BY_ID, INSPECTION_FIND_BY_SUPPLIER, INSPECTION_GET_BY_STATUS,
    SUPPLIER_FIND_ALL, SUPPLIER_FIND_BY_ID, SUPPLIER_FIND_BY_QUALIFICATION,
    SUPPLIER_GET_BY_STATUS, SUPPLIER_SEARCH,
};
use crate::application::services::{CustomerService, InspectionService, SupplierService};
use crate::cache::{CachedService, Tag, WriteKind, entity_tags};
use crate::domain::customers::{CustomerPatch, NewCustomer};
use crate::domain::entities::{
    CUSTOMER, CustomerRecord, INSPECTION, InspectionRecord, SUPPLIER, SupplierRecord,
};
use crate::domain::inspections::{InspectionPatch, NewInspection};
use crate::domain::suppliers::{NewSupplier, SupplierFilter, SupplierPatch};
use crate::domain::types::{CustomerStatus, InspectionStatus, QualificationType, SupplierStatus};

/// The pre-mutation snapshot only sharpens invalidation, so a failed read
/// degrades to `None` and the mutation reports the real error.
fn snapshot<T>(entity: &'static str, id: Uuid, read: Result<T, ServiceError>) -> Option<T> {
    match read {
        Ok(record) => Some(record),
        Err(err) => {
            debug!(entity, %id, error = %err, "Pre-write read failed");
            None
        }
    }
}

#[async_trait]
impl<S: SupplierService> SupplierService for CachedService<S> {
    async fn find_by_id(&self, id: Uuid) -> Result<SupplierRecord, ServiceError> {
        self.coordinator()
            .read_through(SUPPLIER_FIND_BY_ID, &id, Vec::new(), || {
                self.inner().find_by_id(id)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                SUPPLIER_FIND_ALL,
                &(),
                Vec::new(),
                || self.inner().find_all(),
                |records: &Vec<SupplierRecord>| entity_tags(records),
            )
            .await
    }

    async fn search(&self, filter: &SupplierFilter) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                SUPPLIER_SEARCH,
                filter,
                Vec::new(),
                || self.inner().search(filter),
                |records: &Vec<SupplierRecord>| entity_tags(records),
            )
            .await
    }

    async fn get_by_status(
        &self,
        status: SupplierStatus,
    ) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                SUPPLIER_GET_BY_STATUS,
                &status,
                vec![Tag::attribute(SUPPLIER, "status", status.as_str())],
                || self.inner().get_by_status(status),
                |records: &Vec<SupplierRecord>| entity_tags(records),
            )
            .await
    }

    async fn find_by_qualification(
        &self,
        qualification: QualificationType,
    ) -> Result<Vec<SupplierRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                SUPPLIER_FIND_BY_QUALIFICATION,
                &qualification,
                vec![Tag::attribute(
                    SUPPLIER,
                    "qualification",
                    qualification.as_str(),
                )],
                || self.inner().find_by_qualification(qualification),
                |records: &Vec<SupplierRecord>| entity_tags(records),
            )
            .await
    }

    async fn create(&self, input: NewSupplier) -> Result<SupplierRecord, ServiceError> {
        self.coordinator()
            .write_through(
                WriteKind::Create,
                None::<&SupplierRecord>,
                self.inner().create(input),
                |record| Some(record),
            )
            .await
    }

    async fn update(&self, id: Uuid, patch: SupplierPatch) -> Result<SupplierRecord, ServiceError> {
        let before = snapshot(SUPPLIER, id, SupplierService::find_by_id(self, id).await);
        self.coordinator()
            .write_through(
                WriteKind::update(id),
                before.as_ref(),
                self.inner().update(id, patch),
                |record| Some(record),
            )
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let before = snapshot(SUPPLIER, id, SupplierService::find_by_id(self, id).await);
        self.coordinator()
            .write_through(
                WriteKind::delete(id),
                before.as_ref(),
                self.inner().delete(id),
                |_| None,
            )
            .await
    }
}

#[async_trait]
impl<S: CustomerService> CustomerService for CachedService<S> {
    async fn find_by_id(&self, id: Uuid) -> Result<CustomerRecord, ServiceError> {
        self.coordinator()
            .read_through(CUSTOMER_FIND_BY_ID, &id, Vec::new(), || {
                self.inner().find_by_id(id)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<CustomerRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                CUSTOMER_FIND_ALL,
                &(),
                Vec::new(),
                || self.inner().find_all(),
                |records: &Vec<CustomerRecord>| entity_tags(records),
            )
            .await
    }

    async fn get_by_status(
        &self,
        status: CustomerStatus,
    ) -> Result<Vec<CustomerRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                CUSTOMER_GET_BY_STATUS,
                &status,
                vec![Tag::attribute(CUSTOMER, "status", status.as_str())],
                || self.inner().get_by_status(status),
                |records: &Vec<CustomerRecord>| entity_tags(records),
            )
            .await
    }

    async fn create(&self, input: NewCustomer) -> Result<CustomerRecord, ServiceError> {
        self.coordinator()
            .write_through(
                WriteKind::Create,
                None::<&CustomerRecord>,
                self.inner().create(input),
                |record| Some(record),
            )
            .await
    }

    async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<CustomerRecord, ServiceError> {
        let before = snapshot(CUSTOMER, id, CustomerService::find_by_id(self, id).await);
        self.coordinator()
            .write_through(
                WriteKind::update(id),
                before.as_ref(),
                self.inner().update(id, patch),
                |record| Some(record),
            )
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let before = snapshot(CUSTOMER, id, CustomerService::find_by_id(self, id).await);
        self.coordinator()
            .write_through(
                WriteKind::delete(id),
                before.as_ref(),
                self.inner().delete(id),
                |_| None,
            )
            .await
    }
}

#[async_trait]
impl<S: InspectionService> InspectionService for CachedService<S> {
    async fn find_by_id(&self, id: Uuid) -> Result<InspectionRecord, ServiceError> {
        self.coordinator()
            .read_through(INSPECTION_FIND_BY_ID, &id, Vec::new(), || {
                self.inner().find_by_id(id)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<InspectionRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                INSPECTION_FIND_ALL,
                &(),
                Vec::new(),
                || self.inner().find_all(),
                |records: &Vec<InspectionRecord>| entity_tags(records),
            )
            .await
    }

    async fn find_by_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<InspectionRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                INSPECTION_FIND_BY_SUPPLIER,
                &supplier_id,
                vec![Tag::attribute(
                    INSPECTION,
                    "supplier",
                    &supplier_id.to_string(),
                )],
                || self.inner().find_by_supplier(supplier_id),
                |records: &Vec<InspectionRecord>| entity_tags(records),
            )
            .await
    }

    async fn get_by_status(
        &self,
        status: InspectionStatus,
    ) -> Result<Vec<InspectionRecord>, ServiceError> {
        self.coordinator()
            .read_through_with(
                INSPECTION_GET_BY_STATUS,
                &status,
                vec![Tag::attribute(INSPECTION, "status", status.as_str())],
                || self.inner().get_by_status(status),
                |records: &Vec<InspectionRecord>| entity_tags(records),
            )
            .await
    }

    async fn create(&self, input: NewInspection) -> Result<InspectionRecord, ServiceError> {
        self.coordinator()
            .write_through(
                WriteKind::Create,
                None::<&InspectionRecord>,
                self.inner().create(input),
                |record| Some(record),
            )
            .await
    }

    async fn update(
        &self,
        id: Uuid,
        patch: InspectionPatch,
    ) -> Result<InspectionRecord, ServiceError> {
        let before = snapshot(INSPECTION, id, InspectionService::find_by_id(self, id).await);
        self.coordinator()
            .write_through(
                WriteKind::update(id),
                before.as_ref(),
                self.inner().update(id, patch),
                |record| Some(record),
            )
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let before = snapshot(INSPECTION, id, InspectionService::find_by_id(self, id).await);
        self.coordinator()
            .write_through(
                WriteKind::delete(id),
                before.as_ref(),
                self.inner().delete(id),
                |_| None,
            )
            .await
    }
}
