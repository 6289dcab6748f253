//! Rental Ledger Core - Rust Engine
//!
//! Keeps property occupancy and tenant balances consistent on top of a
//! document store with no multi-document transactions.
//!
//! # Architecture
//!
//! - **core**: Billing periods and the injected clock
//! - **models**: Domain types (Property, Tenant, Payment) and validation
//! - **store**: Record store contract, in-memory store, snapshots
//! - **registry**: Property registration and edits
//! - **occupancy**: Tenant lifecycle and occupancy reconciliation
//! - **ledger**: Payments and monthly rent charging
//! - **service**: Presentation-facing facade and configuration
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents)
//! 2. Counters and balances move only by atomic deltas at the store
//! 3. Rent is charged at most once per tenant per billing period
//! 4. Occupancy drift is always repairable by reconciliation

// Module declarations
pub mod core;
pub mod error;
pub mod ledger;
pub mod models;
pub mod occupancy;
pub mod registry;
pub mod service;
pub mod store;

mod repo;

// Re-exports for convenience
pub use crate::core::{should_charge, BillingPeriod, Clock, FixedClock, SystemClock};
pub use error::{Entity, ErrorDescriptor, ErrorKind, LedgerError};
pub use ledger::{
    BatchChargeReport, ChargeFailure, ChargeOutcome, PaymentLedger, PaymentReceipt,
    PaymentReversal, PaymentStats, RentCharger, SkipReason,
};
pub use models::{
    BalanceStanding, FieldError, Payment, PaymentDraft, PaymentMethod, PaymentStatus, Property,
    PropertyDraft, PropertyUpdate, Tenant, TenantDraft, TenantStatus, TenantUpdate,
    ValidationError,
};
pub use occupancy::{
    OccupancyAudit, OccupancyDrift, OccupancyReconciler, Offboarding, ReconcileFailure,
    ReconcileReport, Relocation, StatusChange, TenantLifecycle,
};
pub use registry::{PropertyRegistry, PropertyRemoval};
pub use service::{ConfigError, OffboardMode, RentalService, ServiceConfig, ServiceResult};
pub use store::{
    Collection, Document, FieldUpdate, InMemoryStore, Precondition, Query, RecordStore,
    StoreError, StoreOp, StoreSnapshot,
};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn rent_ledger_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::ledger::PyRentalLedger>()?;
    Ok(())
}
