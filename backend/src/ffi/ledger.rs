//! PyO3 wrapper for the rental service
//!
//! Exposes [`RentalService`] over an in-memory store to Python. Every method
//! returns a dict; service failures come back as `{"ok": False, "error": ...}`
//! instead of raising.

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{parse_input, parse_label, py_to_json, response_to_py};
use crate::core::clock::SystemClock;
use crate::models::{PaymentDraft, PropertyDraft, PropertyUpdate, TenantDraft, TenantStatus, TenantUpdate};
use crate::service::{RentalService, ServiceConfig};
use crate::store::InMemoryStore;

/// Python wrapper for the rental ledger
///
/// # Example (from Python)
///
/// ```python
/// from rent_ledger_core_rs import RentalLedger
///
/// ledger = RentalLedger({"offboard_mode": "mark_inactive"})
/// prop = ledger.register_property(
///     {"name": "Sunrise Court", "address": "12 Ngong Road", "city": "Nairobi", "totalUnits": 10},
///     "landlord-1",
/// )
/// tenant = ledger.onboard_tenant({...}, "landlord-1")
/// report = ledger.charge_active_tenants("landlord-1")
/// print(report["value"]["message"])
/// ```
#[pyclass(name = "RentalLedger")]
pub struct PyRentalLedger {
    runtime: tokio::runtime::Runtime,
    store: Arc<InMemoryStore>,
    service: RentalService,
}

#[pymethods]
impl PyRentalLedger {
    /// Create a ledger with an empty in-memory store
    ///
    /// # Errors
    ///
    /// Raises ValueError if the config is malformed or out of range.
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config: ServiceConfig = match config {
            Some(dict) => serde_json::from_value(py_to_json(dict.as_any())?)
                .map_err(|e| PyValueError::new_err(format!("Invalid config: {}", e)))?,
            None => ServiceConfig::default(),
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to start runtime: {}", e)))?;

        let store = Arc::new(InMemoryStore::with_clock(Arc::new(SystemClock)));
        let service = RentalService::with_memory_store(store.clone(), config)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        Ok(PyRentalLedger {
            runtime,
            store,
            service,
        })
    }

    // ========================================================================
    // Properties
    // ========================================================================

    fn register_property(&self, py: Python<'_>, draft: &Bound<'_, PyDict>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        let result = parse_input::<PropertyDraft>(draft)
            .and_then(|draft| self.runtime.block_on(self.service.register_property(draft, landlord_id)));
        response_to_py(py, result)
    }

    fn update_property(&self, py: Python<'_>, property_id: &str, changes: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
        let result = parse_input::<PropertyUpdate>(changes)
            .and_then(|update| self.runtime.block_on(self.service.update_property(property_id, update)));
        response_to_py(py, result)
    }

    fn remove_property(&self, py: Python<'_>, property_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.remove_property(property_id)))
    }

    fn get_property(&self, py: Python<'_>, property_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.get_property(property_id)))
    }

    fn list_properties(&self, py: Python<'_>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.list_properties(landlord_id)))
    }

    // ========================================================================
    // Tenants
    // ========================================================================

    fn onboard_tenant(&self, py: Python<'_>, draft: &Bound<'_, PyDict>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        let result = parse_input::<TenantDraft>(draft)
            .and_then(|draft| self.runtime.block_on(self.service.onboard_tenant(draft, landlord_id)));
        response_to_py(py, result)
    }

    fn relocate_tenant(&self, py: Python<'_>, tenant_id: &str, new_property_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(
            py,
            self.runtime
                .block_on(self.service.relocate_tenant(tenant_id, new_property_id)),
        )
    }

    fn offboard_tenant(&self, py: Python<'_>, tenant_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.offboard_tenant(tenant_id)))
    }

    fn update_tenant(&self, py: Python<'_>, tenant_id: &str, changes: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
        let result = parse_input::<TenantUpdate>(changes)
            .and_then(|update| self.runtime.block_on(self.service.update_tenant(tenant_id, update)));
        response_to_py(py, result)
    }

    /// Set status to `"active"` or `"inactive"`
    fn set_tenant_status(&self, py: Python<'_>, tenant_id: &str, status: &str) -> PyResult<Py<PyDict>> {
        let result = parse_label::<TenantStatus>(status)
            .and_then(|status| self.runtime.block_on(self.service.set_tenant_status(tenant_id, status)));
        response_to_py(py, result)
    }

    fn get_tenant(&self, py: Python<'_>, tenant_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.get_tenant(tenant_id)))
    }

    fn list_tenants(&self, py: Python<'_>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.list_tenants(landlord_id)))
    }

    fn list_property_tenants(&self, py: Python<'_>, property_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.list_property_tenants(property_id)))
    }

    // ========================================================================
    // Payments
    // ========================================================================

    fn record_payment(&self, py: Python<'_>, draft: &Bound<'_, PyDict>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        let result = parse_input::<PaymentDraft>(draft)
            .and_then(|draft| self.runtime.block_on(self.service.record_payment(draft, landlord_id)));
        response_to_py(py, result)
    }

    fn delete_payment(&self, py: Python<'_>, payment_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.delete_payment(payment_id)))
    }

    fn list_tenant_payments(&self, py: Python<'_>, tenant_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.list_tenant_payments(tenant_id)))
    }

    fn list_property_payments(&self, py: Python<'_>, property_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.list_property_payments(property_id)))
    }

    fn list_payments(&self, py: Python<'_>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.list_payments(landlord_id)))
    }

    fn payment_stats(&self, py: Python<'_>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.payment_stats(landlord_id)))
    }

    // ========================================================================
    // Rent and occupancy
    // ========================================================================

    fn charge_tenant(&self, py: Python<'_>, tenant_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.charge_tenant(tenant_id)))
    }

    fn charge_active_tenants(&self, py: Python<'_>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.charge_active_tenants(landlord_id)))
    }

    fn reconcile_occupancy(&self, py: Python<'_>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.reconcile_occupancy(landlord_id)))
    }

    fn detect_drift(&self, py: Python<'_>, landlord_id: &str) -> PyResult<Py<PyDict>> {
        response_to_py(py, self.runtime.block_on(self.service.detect_drift(landlord_id)))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Current billing period as `"YYYY-MM"`
    fn current_period(&self) -> String {
        self.service.current_period().to_string()
    }

    /// SHA-256 fingerprint of the active config
    fn config_fingerprint(&self) -> PyResult<String> {
        self.service
            .config()
            .fingerprint()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    /// Export the whole store as JSON (with integrity digest)
    fn snapshot_json(&self) -> PyResult<String> {
        let snapshot = self
            .runtime
            .block_on(self.store.snapshot())
            .map_err(|e| PyRuntimeError::new_err(format!("Snapshot failed: {}", e)))?;
        snapshot
            .to_json()
            .map_err(|e| PyRuntimeError::new_err(format!("Snapshot failed: {}", e)))
    }
}
