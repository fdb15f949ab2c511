//! Customer inputs and validation.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::CustomerRecord;
use crate::domain::error::DomainError;
use crate::domain::types::CustomerStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub region: String,
    pub status: CustomerStatus,
}

impl NewCustomer {
    pub fn into_record(self, id: Uuid, now: OffsetDateTime) -> Result<CustomerRecord, DomainError> {
        Ok(CustomerRecord {
            id,
            name: required("name", &self.name)?,
            region: required("region", &self.region)?,
            status: self.status,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub region: Option<String>,
    pub status: Option<CustomerStatus>,
}

impl CustomerPatch {
    pub fn apply(self, record: &mut CustomerRecord, now: OffsetDateTime) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            record.name = required("name", &name)?;
        }
        if let Some(region) = self.region {
            record.region = required("region", &region)?;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        record.updated_at = now;
        Ok(())
    }
}

fn required(field: &'static str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_region_is_rejected() {
        let err = NewCustomer {
            name: "Orbital Dynamics".to_string(),
            region: "   ".to_string(),
            status: CustomerStatus::Prospect,
        }
        .into_record(Uuid::nil(), OffsetDateTime::UNIX_EPOCH)
        .expect_err("blank region");
        assert!(matches!(err, DomainError::Validation { field: "region", .. }));
    }
}
