//! Occupancy Reconciliation Tests
//!
//! Drift detection and repair: recorded `occupiedUnits` is overwritten with
//! the active-tenant count, reports name every drifted property and orphan,
//! and a second run changes nothing.

use chrono::{NaiveDate, TimeZone, Utc};
use rent_ledger_core_rs::core::clock::FixedClock;
use rent_ledger_core_rs::models::{PropertyDraft, TenantDraft, TenantStatus};
use rent_ledger_core_rs::occupancy::{OccupancyReconciler, TenantLifecycle};
use rent_ledger_core_rs::registry::PropertyRegistry;
use rent_ledger_core_rs::service::ServiceConfig;
use rent_ledger_core_rs::store::{Collection, FieldUpdate, InMemoryStore, RecordStore, StoreOp};
use std::sync::Arc;

const LANDLORD: &str = "landlord-1";

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    store: Arc<InMemoryStore>,
    registry: PropertyRegistry,
    lifecycle: TenantLifecycle,
    reconciler: OccupancyReconciler,
}

fn fixture() -> Fixture {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
    ));
    let store = Arc::new(InMemoryStore::with_clock(clock));
    Fixture {
        registry: PropertyRegistry::new(store.clone()),
        lifecycle: TenantLifecycle::new(store.clone(), ServiceConfig::default()),
        reconciler: OccupancyReconciler::new(store.clone()),
        store,
    }
}

impl Fixture {
    async fn add_property(&self, name: &str, landlord: &str) -> String {
        let draft = PropertyDraft {
            name: name.to_string(),
            address: "12 Ngong Road".to_string(),
            city: "Nairobi".to_string(),
            total_units: 10,
            description: None,
        };
        self.registry.register(draft, landlord).await.unwrap()
    }

    async fn add_tenant(&self, property_id: &str, landlord: &str) -> String {
        let draft = TenantDraft {
            first_name: "Tenant".to_string(),
            last_name: "Njeri".to_string(),
            email: "tenant@example.com".to_string(),
            phone: "+254700000000".to_string(),
            property_id: property_id.to_string(),
            unit_number: "1".to_string(),
            rent_amount: 10_000,
            move_in_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            id_number: "12345678".to_string(),
        };
        self.lifecycle.onboard(draft, landlord).await.unwrap()
    }

    async fn corrupt(&self, property_id: &str, occupied: u32) {
        self.store
            .update(
                Collection::Properties,
                property_id,
                vec![FieldUpdate::set("occupiedUnits", occupied)],
                None,
            )
            .await
            .unwrap();
    }

    async fn occupied(&self, property_id: &str) -> u32 {
        self.registry.get(property_id).await.unwrap().occupied_units()
    }
}

// ============================================================================
// Detection
// ============================================================================

#[tokio::test]
async fn test_consistent_ledger_reports_no_drift() {
    let fx = fixture();
    let p1 = fx.add_property("P1", LANDLORD).await;
    fx.add_tenant(&p1, LANDLORD).await;

    let audit = fx.reconciler.detect_drift(LANDLORD).await.unwrap();

    assert!(audit.is_consistent());
    assert_eq!(audit.properties_checked, 1);
    assert_eq!(audit.occupancy[&p1], 1);
    assert!(audit.orphaned_tenants.is_empty());
}

#[tokio::test]
async fn test_detect_drift_writes_nothing() {
    let fx = fixture();
    let p1 = fx.add_property("P1", LANDLORD).await;
    fx.add_tenant(&p1, LANDLORD).await;
    fx.corrupt(&p1, 7).await;

    let audit = fx.reconciler.detect_drift(LANDLORD).await.unwrap();

    assert_eq!(audit.drift.len(), 1);
    assert_eq!(audit.drift[0].property_name, "P1");
    assert_eq!(audit.drift[0].recorded, 7);
    assert_eq!(audit.drift[0].actual, 1);
    assert_eq!(fx.occupied(&p1).await, 7, "detection must not repair");
}

// ============================================================================
// Repair
// ============================================================================

#[tokio::test]
async fn test_reconcile_overwrites_with_active_count() {
    let fx = fixture();
    let p1 = fx.add_property("P1", LANDLORD).await;
    let p2 = fx.add_property("P2", LANDLORD).await;
    fx.add_tenant(&p1, LANDLORD).await;
    fx.add_tenant(&p1, LANDLORD).await;
    let leaving = fx.add_tenant(&p2, LANDLORD).await;
    fx.lifecycle
        .set_status(&leaving, TenantStatus::Inactive)
        .await
        .unwrap();
    fx.corrupt(&p1, 0).await;
    fx.corrupt(&p2, 4).await;

    let report = fx.reconciler.reconcile(LANDLORD).await.unwrap();

    assert_eq!(report.properties_updated, 2);
    assert_eq!(report.audit.drift.len(), 2);
    assert_eq!(report.message, "Updated 2 properties");
    assert_eq!(fx.occupied(&p1).await, 2);
    assert_eq!(fx.occupied(&p2).await, 0, "inactive tenants do not count");
}

#[tokio::test]
async fn test_reconcile_twice_is_idempotent() {
    let fx = fixture();
    let p1 = fx.add_property("P1", LANDLORD).await;
    fx.add_tenant(&p1, LANDLORD).await;
    fx.corrupt(&p1, 9).await;

    fx.reconciler.reconcile(LANDLORD).await.unwrap();
    let first = fx.store.snapshot().await.unwrap();
    let second_report = fx.reconciler.reconcile(LANDLORD).await.unwrap();
    let second = fx.store.snapshot().await.unwrap();

    assert!(second_report.audit.is_consistent());
    assert_eq!(first.digest, second.digest, "second run changed stored data");
}

#[tokio::test]
async fn test_reconcile_scoped_to_landlord() {
    let fx = fixture();
    let mine = fx.add_property("Mine", LANDLORD).await;
    let theirs = fx.add_property("Theirs", "landlord-2").await;
    fx.corrupt(&mine, 3).await;
    fx.corrupt(&theirs, 3).await;

    fx.reconciler.reconcile(LANDLORD).await.unwrap();

    assert_eq!(fx.occupied(&mine).await, 0);
    assert_eq!(fx.occupied(&theirs).await, 3);
}

#[tokio::test]
async fn test_orphans_reported_after_property_removed() {
    let fx = fixture();
    let p1 = fx.add_property("P1", LANDLORD).await;
    let p2 = fx.add_property("P2", LANDLORD).await;
    let orphan = fx.add_tenant(&p1, LANDLORD).await;
    fx.add_tenant(&p2, LANDLORD).await;
    fx.registry.remove(&p1).await.unwrap();

    let report = fx.reconciler.reconcile(LANDLORD).await.unwrap();

    assert_eq!(report.audit.orphaned_tenants, vec![orphan]);
    assert_eq!(report.audit.properties_checked, 1);
    assert_eq!(fx.occupied(&p2).await, 1);
}

#[tokio::test]
async fn test_failed_overwrite_does_not_stop_others() {
    let fx = fixture();
    let p1 = fx.add_property("P1", LANDLORD).await;
    let p2 = fx.add_property("P2", LANDLORD).await;
    fx.add_tenant(&p2, LANDLORD).await;
    fx.corrupt(&p1, 5).await;
    fx.corrupt(&p2, 5).await;
    fx.store
        .fail_always(StoreOp::Update, Collection::Properties, Some(p1.as_str()))
        .await;

    let report = fx.reconciler.reconcile(LANDLORD).await.unwrap();

    assert_eq!(report.properties_updated, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].property_id, p1);
    assert_eq!(report.message, "Updated 1 properties. 1 failed.");
    assert_eq!(fx.occupied(&p2).await, 1);
}

#[tokio::test]
async fn test_reconcile_fails_when_tenants_unreadable() {
    let fx = fixture();
    fx.add_property("P1", LANDLORD).await;
    fx.store
        .fail_next(StoreOp::Query, Collection::Tenants, None)
        .await;

    assert!(fx.reconciler.reconcile(LANDLORD).await.is_err());
}
