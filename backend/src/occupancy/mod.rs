//! Occupancy tracking
//!
//! [`TenantLifecycle`] moves `occupied_units` by atomic deltas as tenants come
//! and go; [`OccupancyReconciler`] recomputes it from scratch when a partial
//! failure has left it drifted.

pub mod lifecycle;
pub mod reconcile;

pub use lifecycle::{Offboarding, Relocation, StatusChange, TenantLifecycle};
pub use reconcile::{
    OccupancyAudit, OccupancyDrift, OccupancyReconciler, ReconcileFailure, ReconcileReport,
};
