//! Domain records as stored by the services and cached by the adapter.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cache::CacheableEntity;
use crate::domain::types::{
    CustomerStatus, InspectionStatus, InspectionType, QualificationType, SupplierStatus,
};

pub const SUPPLIER: &str = "supplier";
pub const CUSTOMER: &str = "customer";
pub const INSPECTION: &str = "inspection";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub id: Uuid,
    pub name: String,
    /// Five-character CAGE code.
    pub cage_code: String,
    pub country: String,
    pub status: SupplierStatus,
    pub qualifications: BTreeSet<QualificationType>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CacheableEntity for SupplierRecord {
    const ENTITY_TYPE: &'static str = SUPPLIER;

    fn cache_id(&self) -> String {
        self.id.to_string()
    }

    fn tag_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![("status", self.status.as_str().to_string())];
        attributes.extend(
            self.qualifications
                .iter()
                .map(|qualification| ("qualification", qualification.as_str().to_string())),
        );
        attributes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    pub region: String,
    pub status: CustomerStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CacheableEntity for CustomerRecord {
    const ENTITY_TYPE: &'static str = CUSTOMER;

    fn cache_id(&self) -> String {
        self.id.to_string()
    }

    fn tag_attributes(&self) -> Vec<(&'static str, String)> {
        vec![("status", self.status.as_str().to_string())]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub inspection_type: InspectionType,
    pub status: InspectionStatus,
    pub scheduled_for: OffsetDateTime,
    pub inspector: Option<String>,
    pub findings: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CacheableEntity for InspectionRecord {
    const ENTITY_TYPE: &'static str = INSPECTION;

    fn cache_id(&self) -> String {
        self.id.to_string()
    }

    fn tag_attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("status", self.status.as_str().to_string()),
            ("supplier", self.supplier_id.to_string()),
        ]
    }
}
