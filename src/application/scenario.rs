//! End-to-end supplier walkthrough used by the `scenario` command.
//!
//! Creates a pending supplier, caches the pending and active lists, activates
//! the supplier and checks that both lists reflect the change immediately.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::memory::InMemorySupplierService;
use crate::application::services::SupplierService;
use crate::cache::{CacheCoordinator, CachedService};
use crate::domain::entities::SupplierRecord;
use crate::domain::suppliers::{NewSupplier, SupplierPatch};
use crate::domain::types::{QualificationType, SupplierStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioStep {
    pub name: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<ScenarioStep>,
    /// Reads that reached the wrapped service.
    pub store_reads: usize,
}

impl ScenarioReport {
    fn step(&mut self, name: &'static str, detail: impl Into<String>) {
        let detail = detail.into();
        info!(step = name, detail = %detail, "Scenario step");
        self.steps.push(ScenarioStep { name, detail });
    }
}

fn contains(records: &[SupplierRecord], id: Uuid) -> bool {
    records.iter().any(|record| record.id == id)
}

fn check(condition: bool, message: &str) -> Result<(), AppError> {
    if condition {
        Ok(())
    } else {
        Err(AppError::scenario(message))
    }
}

pub async fn run_supplier_scenario(
    coordinator: Arc<CacheCoordinator>,
) -> Result<ScenarioReport, AppError> {
    let store = InMemorySupplierService::new();
    let suppliers = CachedService::new(store.clone(), coordinator.clone());
    let mut report = ScenarioReport::default();

    let created = suppliers
        .create(NewSupplier {
            name: "Meridian Aerostructures".to_string(),
            cage_code: "7MER1".to_string(),
            country: "US".to_string(),
            status: SupplierStatus::Pending,
            qualifications: BTreeSet::from([QualificationType::As9100]),
        })
        .await?;
    report.step("create", format!("supplier {} created as pending", created.id));

    let pending = suppliers.get_by_status(SupplierStatus::Pending).await?;
    check(contains(&pending, created.id), "pending list is missing the new supplier")?;
    let active = suppliers.get_by_status(SupplierStatus::Active).await?;
    check(!contains(&active, created.id), "active list already holds a pending supplier")?;
    report.step("populate", "pending and active lists cached");

    if coordinator.is_enabled() {
        let reads = store.reads();
        suppliers.get_by_status(SupplierStatus::Pending).await?;
        check(store.reads() == reads, "repeated pending list read missed the cache")?;
        report.step("hit", "repeated pending list read served from cache");
    }

    suppliers
        .update(created.id, SupplierPatch::status(SupplierStatus::Active))
        .await?;
    report.step("activate", format!("supplier {} moved to active", created.id));

    let pending = suppliers.get_by_status(SupplierStatus::Pending).await?;
    check(!contains(&pending, created.id), "stale pending list still holds the supplier")?;
    let active = suppliers.get_by_status(SupplierStatus::Active).await?;
    check(contains(&active, created.id), "active list is missing the activated supplier")?;
    let current = suppliers.find_by_id(created.id).await?;
    check(current.status == SupplierStatus::Active, "entity lookup returned a stale status")?;
    report.step("verify", "both status lists and the entity reflect the update");

    report.store_reads = store.reads();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::policies;
    use crate::cache::{CacheConfig, InMemoryBackend};

    fn coordinator(config: CacheConfig) -> Arc<CacheCoordinator> {
        let registry = policies::registry(&config).expect("registry");
        let backend = Arc::new(InMemoryBackend::from_config(&config));
        Arc::new(CacheCoordinator::new(config, backend, registry))
    }

    #[tokio::test]
    async fn scenario_passes_with_cache_enabled() {
        let report = run_supplier_scenario(coordinator(CacheConfig::default()))
            .await
            .expect("scenario");
        let names: Vec<&str> = report.steps.iter().map(|step| step.name).collect();
        assert_eq!(names, vec!["create", "populate", "hit", "activate", "verify"]);
    }

    #[tokio::test]
    async fn scenario_passes_with_cache_disabled() {
        let report = run_supplier_scenario(coordinator(CacheConfig::disabled()))
            .await
            .expect("scenario");
        assert!(!report.steps.iter().any(|step| step.name == "hit"));
    }
}
