//! Supplier inputs, filters and validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{SUPPLIER, SupplierRecord};
use crate::domain::error::DomainError;
use crate::domain::types::{QualificationType, SupplierStatus};

const CAGE_CODE_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub cage_code: String,
    pub country: String,
    pub status: SupplierStatus,
    pub qualifications: BTreeSet<QualificationType>,
}

impl NewSupplier {
    pub fn into_record(self, id: Uuid, now: OffsetDateTime) -> Result<SupplierRecord, DomainError> {
        let name = normalize_name(&self.name)?;
        let cage_code = normalize_cage_code(&self.cage_code)?;
        let country = normalize_country(&self.country)?;
        Ok(SupplierRecord {
            id,
            name,
            cage_code,
            country,
            status: self.status,
            qualifications: self.qualifications,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub country: Option<String>,
    pub status: Option<SupplierStatus>,
    pub qualifications: Option<BTreeSet<QualificationType>>,
}

impl SupplierPatch {
    pub fn status(status: SupplierStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply(self, record: &mut SupplierRecord, now: OffsetDateTime) -> Result<(), DomainError> {
        if let Some(name) = self.name {
            record.name = normalize_name(&name)?;
        }
        if let Some(country) = self.country {
            record.country = normalize_country(&country)?;
        }
        if let Some(status) = self.status {
            ensure_transition(record.status, status)?;
            record.status = status;
        }
        if let Some(qualifications) = self.qualifications {
            record.qualifications = qualifications;
        }
        record.updated_at = now;
        Ok(())
    }
}

/// Search criteria; every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierFilter {
    pub status: Option<SupplierStatus>,
    pub qualification: Option<QualificationType>,
    pub country: Option<String>,
    pub name_contains: Option<String>,
}

impl SupplierFilter {
    pub fn matches(&self, record: &SupplierRecord) -> bool {
        self.status.is_none_or(|status| record.status == status)
            && self
                .qualification
                .is_none_or(|qualification| record.qualifications.contains(&qualification))
            && self
                .country
                .as_deref()
                .is_none_or(|country| record.country.eq_ignore_ascii_case(country))
            && self.name_contains.as_deref().is_none_or(|needle| {
                record
                    .name
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
    }
}

/// A supplier never returns to `pending` once it has left it.
fn ensure_transition(from: SupplierStatus, to: SupplierStatus) -> Result<(), DomainError> {
    if to == SupplierStatus::Pending && from != SupplierStatus::Pending {
        return Err(DomainError::invalid_transition(
            SUPPLIER,
            from.as_str(),
            to.as_str(),
        ));
    }
    Ok(())
}

fn normalize_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name", "must not be empty"));
    }
    Ok(name.to_string())
}

fn normalize_cage_code(code: &str) -> Result<String, DomainError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != CAGE_CODE_LEN || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(DomainError::validation(
            "cage_code",
            format!("expected {CAGE_CODE_LEN} alphanumeric characters, got `{code}`"),
        ));
    }
    Ok(code)
}

fn normalize_country(country: &str) -> Result<String, DomainError> {
    let country = country.trim().to_ascii_uppercase();
    if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(DomainError::validation(
            "country",
            "expected an ISO 3166 alpha-2 code",
        ));
    }
    Ok(country)
}
