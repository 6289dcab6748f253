//! Rental Service Integration Tests
//!
//! End-to-end scenarios through the presentation facade, plus the error
//! descriptors callers receive and config handling.

use chrono::{NaiveDate, TimeZone, Utc};
use rent_ledger_core_rs::core::clock::{Clock, FixedClock};
use rent_ledger_core_rs::error::ErrorKind;
use rent_ledger_core_rs::models::{
    PaymentDraft, PaymentMethod, PropertyDraft, PropertyUpdate, TenantDraft,
};
use rent_ledger_core_rs::service::{OffboardMode, RentalService, ServiceConfig};
use rent_ledger_core_rs::store::{Collection, InMemoryStore, StoreOp};
use std::sync::Arc;

const LANDLORD: &str = "landlord-1";

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    store: Arc<InMemoryStore>,
    clock: Arc<FixedClock>,
    service: RentalService,
}

fn fixture_with(config: ServiceConfig) -> Fixture {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
    ));
    let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
    let service = RentalService::with_memory_store(store.clone(), config).unwrap();
    Fixture {
        store,
        clock,
        service,
    }
}

fn fixture() -> Fixture {
    fixture_with(ServiceConfig::default())
}

fn property(name: &str, total_units: i64) -> PropertyDraft {
    PropertyDraft {
        name: name.to_string(),
        address: "12 Ngong Road".to_string(),
        city: "Nairobi".to_string(),
        total_units,
        description: None,
    }
}

fn tenant(property_id: &str, rent: i64) -> TenantDraft {
    TenantDraft {
        first_name: "Wanjiku".to_string(),
        last_name: "Kariuki".to_string(),
        email: "wanjiku@example.com".to_string(),
        phone: "+254700000000".to_string(),
        property_id: property_id.to_string(),
        unit_number: "B4".to_string(),
        rent_amount: rent,
        move_in_date: NaiveDate::from_ymd_opt(2025, 2, 1),
        id_number: "87654321".to_string(),
    }
}

fn mobile_payment(tenant_id: &str, amount: i64) -> PaymentDraft {
    PaymentDraft {
        tenant_id: tenant_id.to_string(),
        property_id: None,
        amount,
        method: PaymentMethod::MobileTransfer,
        reference_id: Some("QWE123RTY".to_string()),
        payment_date: NaiveDate::from_ymd_opt(2025, 3, 10),
        notes: Some("March rent".to_string()),
    }
}

impl Fixture {
    async fn occupied(&self, property_id: &str) -> u32 {
        self.service
            .get_property(property_id)
            .await
            .unwrap()
            .occupied_units()
    }

    async fn balance(&self, tenant_id: &str) -> i64 {
        self.service
            .get_tenant(tenant_id)
            .await
            .unwrap()
            .current_balance()
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_full_tenancy_lifecycle() {
    let fx = fixture();
    let p = fx
        .service
        .register_property(property("Sunrise Court", 10), LANDLORD)
        .await
        .unwrap();
    assert_eq!(fx.occupied(&p).await, 0);

    let t1 = fx.service.onboard_tenant(tenant(&p, 25_000), LANDLORD).await.unwrap();
    assert_eq!(fx.occupied(&p).await, 1);
    assert_eq!(fx.balance(&t1).await, 0);

    let report = fx.service.charge_active_tenants(LANDLORD).await.unwrap();
    assert_eq!(report.charged, 1);
    assert_eq!(fx.balance(&t1).await, 25_000);

    let receipt = fx
        .service
        .record_payment(mobile_payment(&t1, 25_000), LANDLORD)
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, Some(0));

    fx.service.delete_payment(&receipt.payment_id).await.unwrap();
    assert_eq!(fx.balance(&t1).await, 25_000);

    fx.service.offboard_tenant(&t1).await.unwrap();
    assert_eq!(fx.occupied(&p).await, 0);
}

#[tokio::test]
async fn test_relocation_between_properties() {
    let fx = fixture();
    let p1 = fx.service.register_property(property("P1", 10), LANDLORD).await.unwrap();
    let p2 = fx.service.register_property(property("P2", 10), LANDLORD).await.unwrap();
    fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();
    let t2 = fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();
    fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();
    fx.service.onboard_tenant(tenant(&p2, 1_000), LANDLORD).await.unwrap();

    fx.service.relocate_tenant(&t2, &p2).await.unwrap();

    assert_eq!(fx.occupied(&p1).await, 2);
    assert_eq!(fx.occupied(&p2).await, 2);
    let at_p2 = fx.service.list_property_tenants(&p2).await.unwrap();
    assert_eq!(at_p2.len(), 2);
}

#[tokio::test]
async fn test_partial_failure_then_reconcile() {
    let fx = fixture();
    let p1 = fx.service.register_property(property("P1", 10), LANDLORD).await.unwrap();
    fx.store
        .fail_next(StoreOp::Update, Collection::Properties, Some(p1.as_str()))
        .await;

    let err = fx
        .service
        .onboard_tenant(tenant(&p1, 1_000), LANDLORD)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PartialFailure);

    let audit = fx.service.detect_drift(LANDLORD).await.unwrap();
    assert_eq!(audit.drift.len(), 1);

    let report = fx.service.reconcile_occupancy(LANDLORD).await.unwrap();
    assert_eq!(report.message, "Updated 1 properties");
    assert_eq!(fx.occupied(&p1).await, 1);
}

#[tokio::test]
async fn test_mark_inactive_mode_keeps_history() {
    let fx = fixture_with(ServiceConfig {
        offboard_mode: OffboardMode::MarkInactive,
        ..ServiceConfig::default()
    });
    let p1 = fx.service.register_property(property("P1", 10), LANDLORD).await.unwrap();
    let t1 = fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();
    fx.service
        .record_payment(mobile_payment(&t1, 500), LANDLORD)
        .await
        .unwrap();

    fx.service.offboard_tenant(&t1).await.unwrap();

    assert_eq!(fx.occupied(&p1).await, 0);
    assert_eq!(fx.service.list_tenants(LANDLORD).await.unwrap().len(), 1);
    assert_eq!(fx.service.list_tenant_payments(&t1).await.unwrap().len(), 1);
    let report = fx.service.charge_active_tenants(LANDLORD).await.unwrap();
    assert_eq!(report.charged, 0);
}

#[tokio::test]
async fn test_payment_stats_through_service() {
    let fx = fixture();
    let p1 = fx.service.register_property(property("P1", 10), LANDLORD).await.unwrap();
    let t1 = fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();
    fx.service.record_payment(mobile_payment(&t1, 400), LANDLORD).await.unwrap();
    fx.service.record_payment(mobile_payment(&t1, 600), LANDLORD).await.unwrap();

    let stats = fx.service.payment_stats(LANDLORD).await.unwrap();

    assert_eq!(stats.total_revenue, 1_000);
    assert_eq!(stats.period_revenue, 1_000);
    assert_eq!(stats.period, fx.service.current_period());
    assert_eq!(fx.service.list_property_payments(&p1).await.unwrap().len(), 2);
    assert_eq!(fx.service.list_payments(LANDLORD).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_charge_tenant_directly() {
    let fx = fixture();
    let p1 = fx.service.register_property(property("P1", 10), LANDLORD).await.unwrap();
    let t1 = fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();

    assert!(fx.service.charge_tenant(&t1).await.unwrap().is_charged());
    assert!(!fx.service.charge_tenant(&t1).await.unwrap().is_charged());
    fx.clock.set(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap());
    assert!(fx.service.charge_tenant(&t1).await.unwrap().is_charged());
}

#[tokio::test]
async fn test_memory_store_service_shares_the_store_clock() {
    let fx = fixture();
    let p1 = fx.service.register_property(property("P1", 10), LANDLORD).await.unwrap();
    let t1 = fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();

    // Last minute of March, then the first of April: the service period and
    // the store's lastRentCharged stamp must move together.
    fx.clock.set(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 0).unwrap());
    fx.service.charge_tenant(&t1).await.unwrap();
    let stamped = fx.service.get_tenant(&t1).await.unwrap().last_rent_charged();
    assert_eq!(stamped, Some(fx.clock.now()));
    assert_eq!(fx.service.current_period().to_string(), "2025-03");

    fx.clock.advance(chrono::Duration::minutes(2));
    assert_eq!(fx.service.current_period().to_string(), "2025-04");
    assert!(fx.service.charge_tenant(&t1).await.unwrap().is_charged());
    assert_eq!(fx.service.get_tenant(&t1).await.unwrap().current_balance(), 2_000);
}

// ============================================================================
// Error Descriptors
// ============================================================================

#[tokio::test]
async fn test_validation_descriptor_lists_fields() {
    let fx = fixture();
    let err = fx
        .service
        .register_property(property("", 0), LANDLORD)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "totalUnits"]);
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let fx = fixture();
    assert_eq!(
        fx.service.get_tenant("ghost").await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(
        fx.service.delete_payment("ghost").await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(
        fx.service.offboard_tenant("ghost").await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(
        fx.service
            .update_property("ghost", PropertyUpdate::default())
            .await
            .unwrap_err()
            .kind,
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_store_outage_is_store_error() {
    let fx = fixture();
    fx.store
        .fail_next(StoreOp::Query, Collection::Properties, None)
        .await;

    let err = fx.service.list_properties(LANDLORD).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Store);
}

#[tokio::test]
async fn test_descriptor_serializes_for_presentation() {
    let fx = fixture();
    let err = fx
        .service
        .register_property(property("P1", -3), LANDLORD)
        .await
        .unwrap_err();

    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["kind"], "validation");
    assert_eq!(json["fields"][0]["field"], "totalUnits");
}

#[tokio::test]
async fn test_property_update_cannot_undercut_occupancy() {
    let fx = fixture();
    let p1 = fx.service.register_property(property("P1", 2), LANDLORD).await.unwrap();
    fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();
    fx.service.onboard_tenant(tenant(&p1, 1_000), LANDLORD).await.unwrap();

    let shrink = PropertyUpdate {
        total_units: Some(1),
        ..PropertyUpdate::default()
    };
    let err = fx.service.update_property(&p1, shrink).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let rename = PropertyUpdate {
        name: Some("P1 Annex".to_string()),
        total_units: Some(4),
        ..PropertyUpdate::default()
    };
    let updated = fx.service.update_property(&p1, rename).await.unwrap();
    assert_eq!(updated.name(), "P1 Annex");
    assert_eq!(updated.total_units(), 4);
    assert_eq!(updated.occupied_units(), 2);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_invalid_config_rejected_at_construction() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let config = ServiceConfig {
        currency: String::new(),
        ..ServiceConfig::default()
    };
    assert!(RentalService::new(store, clock, config).is_err());
}

#[test]
fn test_config_from_json() {
    let config = ServiceConfig::from_json(
        r#"{"currency": "USD", "offboard_mode": "mark_inactive", "billing_utc_offset_minutes": -300}"#,
    )
    .unwrap();
    assert_eq!(config.currency, "USD");
    assert_eq!(config.offboard_mode, OffboardMode::MarkInactive);
    assert_eq!(config.utc_offset().local_minus_utc(), -300 * 60);
    assert!(!config.enforce_capacity);
}

#[test]
fn test_config_rejects_unknown_offboard_mode() {
    assert!(ServiceConfig::from_json(r#"{"offboard_mode": "archive"}"#).is_err());
}
