//! Presentation-facing service
//!
//! [`RentalService`] wires every component to one shared store and clock and
//! converts component errors into [`ErrorDescriptor`] values, so callers get a
//! serializable `{kind, message, fields}` on every failure.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use rent_ledger_core_rs::core::clock::SystemClock;
//! use rent_ledger_core_rs::models::PropertyDraft;
//! use rent_ledger_core_rs::store::InMemoryStore;
//! use rent_ledger_core_rs::{RentalService, ServiceConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = Arc::new(InMemoryStore::with_clock(Arc::new(SystemClock)));
//! let service = RentalService::with_memory_store(store, ServiceConfig::default()).unwrap();
//!
//! let draft = PropertyDraft {
//!     name: "Sunrise Court".to_string(),
//!     address: "12 Ngong Road".to_string(),
//!     city: "Nairobi".to_string(),
//!     total_units: 10,
//!     description: None,
//! };
//! let property_id = service.register_property(draft, "landlord-1").await.unwrap();
//! let property = service.get_property(&property_id).await.unwrap();
//! assert_eq!(property.occupied_units(), 0);
//! # });
//! ```

pub mod config;

use crate::core::clock::Clock;
use crate::core::period::BillingPeriod;
use crate::error::{ErrorDescriptor, ErrorKind, LedgerError};
use crate::ledger::{
    BatchChargeReport, ChargeOutcome, PaymentLedger, PaymentReceipt, PaymentReversal,
    PaymentStats, RentCharger,
};
use crate::models::{
    Payment, PaymentDraft, Property, PropertyDraft, PropertyUpdate, Tenant, TenantDraft,
    TenantStatus, TenantUpdate,
};
use crate::occupancy::{
    OccupancyAudit, OccupancyReconciler, Offboarding, ReconcileReport, Relocation, StatusChange,
    TenantLifecycle,
};
use crate::registry::{PropertyRegistry, PropertyRemoval};
use crate::store::{InMemoryStore, RecordStore};
use std::sync::Arc;
use tracing::debug;

pub use config::{ConfigError, OffboardMode, ServiceConfig};

/// Result of every service call
pub type ServiceResult<T> = Result<T, ErrorDescriptor>;

impl From<ConfigError> for ErrorDescriptor {
    fn from(err: ConfigError) -> Self {
        ErrorDescriptor::new(ErrorKind::Config, err.to_string())
    }
}

/// Rental ledger API
pub struct RentalService {
    config: ServiceConfig,
    properties: PropertyRegistry,
    tenants: TenantLifecycle,
    payments: PaymentLedger,
    rent: RentCharger,
    reconciler: OccupancyReconciler,
}

impl RentalService {
    /// Build the service over an in-memory store, reading time from the
    /// store's own clock
    pub fn with_memory_store(store: Arc<InMemoryStore>, config: ServiceConfig) -> Result<Self, ConfigError> {
        let clock = store.clock();
        Self::new(store, clock, config)
    }

    /// Build the service over a store and clock
    ///
    /// `clock` must be the time source behind the store's server timestamps.
    /// Otherwise `lastRentCharged` is stamped in one timeline and compared
    /// against billing periods from another.
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        config: ServiceConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            offboard_mode = ?config.offboard_mode,
            utc_offset_minutes = config.billing_utc_offset_minutes,
            enforce_capacity = config.enforce_capacity,
            "rental service configured"
        );
        Ok(Self {
            properties: PropertyRegistry::new(Arc::clone(&store)),
            tenants: TenantLifecycle::new(Arc::clone(&store), config.clone()),
            payments: PaymentLedger::new(Arc::clone(&store), Arc::clone(&clock), config.clone()),
            rent: RentCharger::new(Arc::clone(&store), clock, config.clone()),
            reconciler: OccupancyReconciler::new(store),
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn current_period(&self) -> BillingPeriod {
        self.rent.current_period()
    }

    // ========================================================================
    // Properties
    // ========================================================================

    pub async fn register_property(&self, draft: PropertyDraft, landlord_id: &str) -> ServiceResult<String> {
        respond(self.properties.register(draft, landlord_id).await)
    }

    pub async fn update_property(&self, property_id: &str, update: PropertyUpdate) -> ServiceResult<Property> {
        respond(self.properties.update(property_id, update).await)
    }

    pub async fn remove_property(&self, property_id: &str) -> ServiceResult<PropertyRemoval> {
        respond(self.properties.remove(property_id).await)
    }

    pub async fn get_property(&self, property_id: &str) -> ServiceResult<Property> {
        respond(self.properties.get(property_id).await)
    }

    pub async fn list_properties(&self, landlord_id: &str) -> ServiceResult<Vec<Property>> {
        respond(self.properties.list_by_landlord(landlord_id).await)
    }

    // ========================================================================
    // Tenants
    // ========================================================================

    pub async fn onboard_tenant(&self, draft: TenantDraft, landlord_id: &str) -> ServiceResult<String> {
        respond(self.tenants.onboard(draft, landlord_id).await)
    }

    pub async fn relocate_tenant(&self, tenant_id: &str, new_property_id: &str) -> ServiceResult<Relocation> {
        respond(self.tenants.relocate(tenant_id, new_property_id).await)
    }

    pub async fn offboard_tenant(&self, tenant_id: &str) -> ServiceResult<Offboarding> {
        respond(self.tenants.offboard(tenant_id).await)
    }

    pub async fn update_tenant(&self, tenant_id: &str, update: TenantUpdate) -> ServiceResult<Tenant> {
        respond(self.tenants.update_details(tenant_id, update).await)
    }

    pub async fn set_tenant_status(&self, tenant_id: &str, status: TenantStatus) -> ServiceResult<StatusChange> {
        respond(self.tenants.set_status(tenant_id, status).await)
    }

    pub async fn get_tenant(&self, tenant_id: &str) -> ServiceResult<Tenant> {
        respond(self.tenants.get(tenant_id).await)
    }

    pub async fn list_tenants(&self, landlord_id: &str) -> ServiceResult<Vec<Tenant>> {
        respond(self.tenants.list_by_landlord(landlord_id).await)
    }

    pub async fn list_property_tenants(&self, property_id: &str) -> ServiceResult<Vec<Tenant>> {
        respond(self.tenants.list_by_property(property_id).await)
    }

    // ========================================================================
    // Payments
    // ========================================================================

    pub async fn record_payment(&self, draft: PaymentDraft, landlord_id: &str) -> ServiceResult<PaymentReceipt> {
        respond(self.payments.record(draft, landlord_id).await)
    }

    pub async fn delete_payment(&self, payment_id: &str) -> ServiceResult<PaymentReversal> {
        respond(self.payments.reverse(payment_id).await)
    }

    pub async fn get_payment(&self, payment_id: &str) -> ServiceResult<Payment> {
        respond(self.payments.get(payment_id).await)
    }

    pub async fn list_tenant_payments(&self, tenant_id: &str) -> ServiceResult<Vec<Payment>> {
        respond(self.payments.list_by_tenant(tenant_id).await)
    }

    pub async fn list_property_payments(&self, property_id: &str) -> ServiceResult<Vec<Payment>> {
        respond(self.payments.list_by_property(property_id).await)
    }

    pub async fn list_payments(&self, landlord_id: &str) -> ServiceResult<Vec<Payment>> {
        respond(self.payments.list_by_landlord(landlord_id).await)
    }

    pub async fn payment_stats(&self, landlord_id: &str) -> ServiceResult<PaymentStats> {
        respond(self.payments.stats(landlord_id).await)
    }

    // ========================================================================
    // Rent
    // ========================================================================

    pub async fn charge_tenant(&self, tenant_id: &str) -> ServiceResult<ChargeOutcome> {
        respond(self.rent.charge_one(tenant_id).await)
    }

    pub async fn charge_active_tenants(&self, landlord_id: &str) -> ServiceResult<BatchChargeReport> {
        respond(self.rent.charge_active_tenants(landlord_id).await)
    }

    // ========================================================================
    // Occupancy repair
    // ========================================================================

    pub async fn reconcile_occupancy(&self, landlord_id: &str) -> ServiceResult<ReconcileReport> {
        respond(self.reconciler.reconcile(landlord_id).await)
    }

    pub async fn detect_drift(&self, landlord_id: &str) -> ServiceResult<OccupancyAudit> {
        respond(self.reconciler.detect_drift(landlord_id).await)
    }
}

fn respond<T>(result: Result<T, LedgerError>) -> ServiceResult<T> {
    result.map_err(|err| {
        debug!(error = %err, "service call failed");
        ErrorDescriptor::from(err)
    })
}
