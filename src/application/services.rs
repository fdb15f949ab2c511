//! Service traits describing the domain operations the cache wraps.

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::domain::customers::{CustomerPatch, NewCustomer};
use crate::domain::entities::{CustomerRecord, InspectionRecord, SupplierRecord};
use crate::domain::inspections::{InspectionPatch, NewInspection};
use crate::domain::suppliers::{NewSupplier, SupplierFilter, SupplierPatch};
use crate::domain::types::{CustomerStatus, InspectionStatus, QualificationType, SupplierStatus};

#[async_trait]
pub trait SupplierService: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<SupplierRecord, ServiceError>;

    async fn find_all(&self) -> Result<Vec<SupplierRecord>, ServiceError>;

    async fn search(&self, filter: &SupplierFilter) -> Result<Vec<SupplierRecord>, ServiceError>;

    async fn get_by_status(
        &self,
        status: SupplierStatus,
    ) -> Result<Vec<SupplierRecord>, ServiceError>;

    async fn find_by_qualification(
        &self,
        qualification: QualificationType,
    ) -> Result<Vec<SupplierRecord>, ServiceError>;

    async fn create(&self, input: NewSupplier) -> Result<SupplierRecord, ServiceError>;

    async fn update(&self, id: Uuid, patch: SupplierPatch) -> Result<SupplierRecord, ServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait CustomerService: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<CustomerRecord, ServiceError>;

    async fn find_all(&self) -> Result<Vec<CustomerRecord>, ServiceError>;

    async fn get_by_status(
        &self,
        status: CustomerStatus,
    ) -> Result<Vec<CustomerRecord>, ServiceError>;

    async fn create(&self, input: NewCustomer) -> Result<CustomerRecord, ServiceError>;

    async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<CustomerRecord, ServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait InspectionService: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<InspectionRecord, ServiceError>;

    async fn find_all(&self) -> Result<Vec<InspectionRecord>, ServiceError>;

    async fn find_by_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<InspectionRecord>, ServiceError>;

    async fn get_by_status(
        &self,
        status: InspectionStatus,
    ) -> Result<Vec<InspectionRecord>, ServiceError>;

    async fn create(&self, input: NewInspection) -> Result<InspectionRecord, ServiceError>;

    async fn update(
        &self,
        id: Uuid,
        patch: InspectionPatch,
    ) -> Result<InspectionRecord, ServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;
}
