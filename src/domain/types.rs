//! Shared domain enumerations.
//!
//! `as_str` values double as tag values, so they are lowercase and stable.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierStatus {
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl SupplierStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SupplierStatus::Pending => "pending",
            SupplierStatus::Active => "active",
            SupplierStatus::Inactive => "inactive",
            SupplierStatus::Suspended => "suspended",
        }
    }
}

/// Quality-system approvals a supplier can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationType {
    As9100,
    Iso9001,
    Nadcap,
    Itar,
}

impl QualificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            QualificationType::As9100 => "as9100",
            QualificationType::Iso9001 => "iso9001",
            QualificationType::Nadcap => "nadcap",
            QualificationType::Itar => "itar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Prospect,
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerStatus::Prospect => "prospect",
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Scheduled,
    InProgress,
    Passed,
    Failed,
    Cancelled,
}

impl InspectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InspectionStatus::Scheduled => "scheduled",
            InspectionStatus::InProgress => "in_progress",
            InspectionStatus::Passed => "passed",
            InspectionStatus::Failed => "failed",
            InspectionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InspectionStatus::Passed | InspectionStatus::Failed | InspectionStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    FirstArticle,
    Source,
    Receiving,
    Audit,
}

impl InspectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            InspectionType::FirstArticle => "first_article",
            InspectionType::Source => "source",
            InspectionType::Receiving => "receiving",
            InspectionType::Audit => "audit",
        }
    }
}
