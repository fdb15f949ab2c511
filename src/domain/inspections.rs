//! Inspection inputs and lifecycle rules.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{INSPECTION, InspectionRecord};
use crate::domain::error::DomainError;
use crate::domain::types::{InspectionStatus, InspectionType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInspection {
    pub supplier_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub inspection_type: InspectionType,
    pub scheduled_for: OffsetDateTime,
    pub inspector: Option<String>,
}

impl NewInspection {
    /// New inspections always start out `scheduled`.
    pub fn into_record(self, id: Uuid, now: OffsetDateTime) -> InspectionRecord {
        InspectionRecord {
            id,
            supplier_id: self.supplier_id,
            customer_id: self.customer_id,
            inspection_type: self.inspection_type,
            status: InspectionStatus::Scheduled,
            scheduled_for: self.scheduled_for,
            inspector: self.inspector,
            findings: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionPatch {
    pub status: Option<InspectionStatus>,
    pub scheduled_for: Option<OffsetDateTime>,
    pub inspector: Option<String>,
    pub findings: Option<String>,
}

impl InspectionPatch {
    pub fn status(status: InspectionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Terminal inspections (passed, failed, cancelled) are read-only.
    pub fn apply(self, record: &mut InspectionRecord, now: OffsetDateTime) -> Result<(), DomainError> {
        if record.status.is_terminal() {
            let to = self.status.unwrap_or(record.status);
            return Err(DomainError::invalid_transition(
                INSPECTION,
                record.status.as_str(),
                to.as_str(),
            ));
        }
        if let Some(status) = self.status {
            if status == InspectionStatus::Failed && self.findings.is_none() && record.findings.is_none() {
                return Err(DomainError::validation(
                    "findings",
                    "a failed inspection must record findings",
                ));
            }
            record.status = status;
        }
        if let Some(scheduled_for) = self.scheduled_for {
            record.scheduled_for = scheduled_for;
        }
        if let Some(inspector) = self.inspector {
            record.inspector = Some(inspector);
        }
        if let Some(findings) = self.findings {
            record.findings = Some(findings);
        }
        record.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled() -> InspectionRecord {
        NewInspection {
            supplier_id: Uuid::nil(),
            customer_id: None,
            inspection_type: InspectionType::FirstArticle,
            scheduled_for: OffsetDateTime::UNIX_EPOCH,
            inspector: None,
        }
        .into_record(Uuid::nil(), OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn failing_requires_findings() {
        let mut record = scheduled();
        let err = InspectionPatch::status(InspectionStatus::Failed)
            .apply(&mut record, OffsetDateTime::UNIX_EPOCH)
            .expect_err("no findings");
        assert!(matches!(err, DomainError::Validation { field: "findings", .. }));

        InspectionPatch {
            status: Some(InspectionStatus::Failed),
            findings: Some("porosity in weld seam".to_string()),
            ..InspectionPatch::default()
        }
        .apply(&mut record, OffsetDateTime::UNIX_EPOCH)
        .expect("failed with findings");
        assert_eq!(record.status, InspectionStatus::Failed);
    }

    #[test]
    fn terminal_inspections_are_read_only() {
        let mut record = scheduled();
        InspectionPatch::status(InspectionStatus::Passed)
            .apply(&mut record, OffsetDateTime::UNIX_EPOCH)
            .expect("scheduled -> passed");

        let err = InspectionPatch::status(InspectionStatus::InProgress)
            .apply(&mut record, OffsetDateTime::UNIX_EPOCH)
            .expect_err("passed is terminal");
        assert_eq!(
            err,
            DomainError::invalid_transition(INSPECTION, "passed", "in_progress")
        );
    }
}
