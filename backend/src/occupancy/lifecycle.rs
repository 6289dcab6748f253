//! Tenant Lifecycle Manager
//!
//! Onboards, relocates, re-statuses and offboards tenants, keeping each
//! property's `occupied_units` in step with its active tenants.
//!
//! # Write Ordering
//!
//! ```text
//! onboard:   create tenant ──▶ occupied(P) += 1
//! relocate:  tenant.propertyId = P2 ──▶ occupied(P1) -= 1 ──▶ occupied(P2) += 1
//! offboard:  delete / deactivate tenant ──▶ occupied(P) -= 1
//! ```
//!
//! Each arrow is a separate store write with no transaction around them. A
//! failure after the first write returns [`LedgerError::Incomplete`]; the
//! occupancy reconciler is the repair path.
//!
//! # Critical Invariants
//!
//! - Counters move only through atomic deltas, decrements floored at 0
//! - Only the caller whose write removed an active tenant retracts its
//!   occupancy, so concurrent offboards of one tenant retract it once
//! - Inactive tenants never contribute to occupancy

use crate::error::{Entity, LedgerError};
use crate::models::property::fields as property_fields;
use crate::models::tenant::fields as tenant_fields;
use crate::models::{Property, Tenant, TenantDraft, TenantStatus, TenantUpdate, ValidationError};
use crate::repo;
use crate::service::config::{OffboardMode, ServiceConfig};
use crate::store::{
    decode, encode, Collection, FieldUpdate, Precondition, Query, RecordStore, StoreError,
    CREATED_AT,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a relocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relocation {
    pub tenant_id: String,
    pub from_property_id: String,
    pub to_property_id: String,
    /// False when the tenant already lived at the target property
    pub moved: bool,
    /// Whether occupancy counters were adjusted (active tenants only)
    pub counters_moved: bool,
}

/// Result of an offboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offboarding {
    pub tenant_id: String,
    pub property_id: String,
    pub mode: OffboardMode,
    /// Whether this call retracted the tenant's occupancy
    pub retracted: bool,
    /// Property occupancy after the retraction, if the property still exists
    pub occupied_units: Option<u32>,
}

/// Result of a status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub tenant_id: String,
    pub from: TenantStatus,
    pub to: TenantStatus,
    pub changed: bool,
}

/// Tenant lifecycle operations
pub struct TenantLifecycle {
    store: Arc<dyn RecordStore>,
    config: ServiceConfig,
}

impl TenantLifecycle {
    pub fn new(store: Arc<dyn RecordStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// Onboard a tenant and occupy one unit of its property
    ///
    /// Returns the new tenant id.
    pub async fn onboard(&self, draft: TenantDraft, landlord_id: &str) -> Result<String, LedgerError> {
        let tenant = Tenant::new(draft, landlord_id)?;
        let property = repo::load_owned_property(&*self.store, tenant.property_id(), landlord_id)
            .await?;
        self.check_capacity(&property)?;

        let doc = self
            .store
            .create(Collection::Tenants, encode(&tenant)?)
            .await?;
        info!(
            tenant_id = %doc.id,
            property_id = property.id(),
            rent_amount = tenant.rent_amount(),
            "tenant onboarded"
        );

        match self.adjust_occupancy(property.id(), 1).await {
            Ok(occupied) => {
                debug!(property_id = property.id(), ?occupied, "occupancy incremented");
                Ok(doc.id)
            }
            Err(e) => Err(LedgerError::Incomplete {
                operation: "onboard",
                detail: format!(
                    "tenant {} created but property {} not incremented ({})",
                    doc.id,
                    property.id(),
                    e
                ),
            }),
        }
    }

    /// Move a tenant to another property
    pub async fn relocate(&self, tenant_id: &str, new_property_id: &str) -> Result<Relocation, LedgerError> {
        if new_property_id.trim().is_empty() {
            return Err(ValidationError::single(tenant_fields::PROPERTY_ID, "Property is required").into());
        }

        let tenant = repo::load_tenant(&*self.store, tenant_id).await?;
        let from = tenant.property_id().to_string();
        if from == new_property_id {
            return Ok(Relocation {
                tenant_id: tenant_id.to_string(),
                from_property_id: from,
                to_property_id: new_property_id.to_string(),
                moved: false,
                counters_moved: false,
            });
        }

        let target = repo::load_owned_property(&*self.store, new_property_id, tenant.landlord_id())
            .await?;
        if tenant.is_active() {
            self.check_capacity(&target)?;
        }

        self.store
            .update(
                Collection::Tenants,
                tenant_id,
                vec![FieldUpdate::set(tenant_fields::PROPERTY_ID, new_property_id)],
                Some(
                    Precondition::field_equals(tenant_fields::PROPERTY_ID, from.as_str())
                        .and_field_equals(tenant_fields::STATUS, tenant.status().as_str()),
                ),
            )
            .await
            .map_err(|e| guarded_write_error(e, tenant_id, "tenant was changed by another session"))?;
        info!(tenant_id, from = %from, to = new_property_id, "tenant relocated");

        if !tenant.is_active() {
            return Ok(Relocation {
                tenant_id: tenant_id.to_string(),
                from_property_id: from,
                to_property_id: new_property_id.to_string(),
                moved: true,
                counters_moved: false,
            });
        }

        if let Err(e) = self.retract_occupancy(&from).await {
            return Err(LedgerError::Incomplete {
                operation: "relocate",
                detail: format!(
                    "tenant {} moved to {} but {} not decremented ({})",
                    tenant_id, new_property_id, from, e
                ),
            });
        }
        if let Err(e) = self.adjust_occupancy(new_property_id, 1).await {
            return Err(LedgerError::Incomplete {
                operation: "relocate",
                detail: format!(
                    "tenant {} moved and {} decremented but {} not incremented ({})",
                    tenant_id, from, new_property_id, e
                ),
            });
        }

        Ok(Relocation {
            tenant_id: tenant_id.to_string(),
            from_property_id: from,
            to_property_id: new_property_id.to_string(),
            moved: true,
            counters_moved: true,
        })
    }

    /// Move a tenant out, per the configured [`OffboardMode`]
    pub async fn offboard(&self, tenant_id: &str) -> Result<Offboarding, LedgerError> {
        let mode = self.config.offboard_mode;
        let (tenant, retract) = match mode {
            OffboardMode::Delete => {
                let Some(doc) = self.store.delete(Collection::Tenants, tenant_id).await? else {
                    return Err(LedgerError::not_found(Entity::Tenant, tenant_id));
                };
                let tenant: Tenant = decode(doc)?;
                let was_active = tenant.is_active();
                (tenant, was_active)
            }
            OffboardMode::MarkInactive => {
                let tenant = repo::load_tenant(&*self.store, tenant_id).await?;
                let retract = tenant.is_active() && self.deactivate(&tenant).await?;
                (tenant, retract)
            }
        };
        info!(tenant_id, property_id = tenant.property_id(), ?mode, "tenant offboarded");

        let occupied_units = if retract {
            self.retract_occupancy(tenant.property_id())
                .await
                .map_err(|e| LedgerError::Incomplete {
                    operation: "offboard",
                    detail: format!(
                        "tenant {} removed but property {} not decremented ({})",
                        tenant_id,
                        tenant.property_id(),
                        e
                    ),
                })?
        } else {
            None
        };

        Ok(Offboarding {
            tenant_id: tenant_id.to_string(),
            property_id: tenant.property_id().to_string(),
            mode,
            retracted: retract,
            occupied_units,
        })
    }

    /// Switch a tenant between active and inactive
    ///
    /// Occupancy moves once per real transition; setting the current status
    /// writes nothing.
    pub async fn set_status(&self, tenant_id: &str, status: TenantStatus) -> Result<StatusChange, LedgerError> {
        let tenant = repo::load_tenant(&*self.store, tenant_id).await?;
        let from = tenant.status();
        if from == status {
            return Ok(StatusChange {
                tenant_id: tenant_id.to_string(),
                from,
                to: status,
                changed: false,
            });
        }

        if status.is_active() {
            let property = repo::load_property(&*self.store, tenant.property_id()).await?;
            self.check_capacity(&property)?;
        }

        self.store
            .update(
                Collection::Tenants,
                tenant_id,
                vec![FieldUpdate::set(tenant_fields::STATUS, status.as_str())],
                Some(
                    Precondition::field_equals(tenant_fields::STATUS, from.as_str())
                        .and_field_equals(tenant_fields::PROPERTY_ID, tenant.property_id()),
                ),
            )
            .await
            .map_err(|e| guarded_write_error(e, tenant_id, "tenant was changed by another session"))?;
        info!(tenant_id, from = %from, to = %status, "tenant status changed");

        let adjusted = if status.is_active() {
            self.adjust_occupancy(tenant.property_id(), 1).await
        } else {
            self.retract_occupancy(tenant.property_id()).await
        };
        adjusted.map_err(|e| LedgerError::Incomplete {
            operation: "set_status",
            detail: format!(
                "tenant {} is {} but property {} not adjusted ({})",
                tenant_id,
                status,
                tenant.property_id(),
                e
            ),
        })?;

        Ok(StatusChange {
            tenant_id: tenant_id.to_string(),
            from,
            to: status,
            changed: true,
        })
    }

    /// Edit tenant details; a changed property is applied as a relocation
    ///
    /// The target property is checked before anything is written, so a
    /// rejected move leaves the tenant untouched.
    pub async fn update_details(&self, tenant_id: &str, update: TenantUpdate) -> Result<Tenant, LedgerError> {
        update.validate()?;
        let current = repo::load_tenant(&*self.store, tenant_id).await?;

        let new_property_id = update
            .property_id
            .as_deref()
            .map(str::trim)
            .filter(|p| *p != current.property_id());
        if let Some(property_id) = new_property_id {
            let target = repo::load_owned_property(&*self.store, property_id, current.landlord_id())
                .await?;
            if current.is_active() {
                self.check_capacity(&target)?;
            }
        }

        let writes = update.field_updates(&current);
        if !writes.is_empty() {
            self.store
                .update(
                    Collection::Tenants,
                    tenant_id,
                    writes,
                    Some(Precondition::field_equals(
                        tenant_fields::PROPERTY_ID,
                        current.property_id(),
                    )),
                )
                .await
                .map_err(|e| guarded_write_error(e, tenant_id, "tenant was moved by another session"))?;
            debug!(tenant_id, "tenant details updated");
        }

        if let Some(property_id) = new_property_id {
            self.relocate(tenant_id, property_id).await?;
        }

        repo::load_tenant(&*self.store, tenant_id).await
    }

    pub async fn get(&self, tenant_id: &str) -> Result<Tenant, LedgerError> {
        repo::load_tenant(&*self.store, tenant_id).await
    }

    /// Landlord's tenants, oldest first
    pub async fn list_by_landlord(&self, landlord_id: &str) -> Result<Vec<Tenant>, LedgerError> {
        let query = Query::new()
            .where_eq(tenant_fields::LANDLORD_ID, landlord_id)
            .order_by_asc(CREATED_AT);
        repo::list(&*self.store, Collection::Tenants, &query).await
    }

    /// Tenants assigned to a property (any status), oldest first
    pub async fn list_by_property(&self, property_id: &str) -> Result<Vec<Tenant>, LedgerError> {
        let query = Query::new()
            .where_eq(tenant_fields::PROPERTY_ID, property_id)
            .order_by_asc(CREATED_AT);
        repo::list(&*self.store, Collection::Tenants, &query).await
    }

    fn check_capacity(&self, property: &Property) -> Result<(), LedgerError> {
        if self.config.enforce_capacity && !property.has_vacancy() {
            return Err(ValidationError::single(
                tenant_fields::PROPERTY_ID,
                "Property has no vacant units",
            )
            .into());
        }
        Ok(())
    }

    /// Flip an active tenant to inactive; false if someone else already did
    ///
    /// Requires the tenant to still be on the property it was read with; that
    /// is the property the caller retracts.
    async fn deactivate(&self, tenant: &Tenant) -> Result<bool, LedgerError> {
        let tenant_id = tenant.id();
        let result = self
            .store
            .update(
                Collection::Tenants,
                tenant_id,
                vec![FieldUpdate::set(tenant_fields::STATUS, TenantStatus::Inactive.as_str())],
                Some(
                    Precondition::field_equals(tenant_fields::STATUS, TenantStatus::Active.as_str())
                        .and_field_equals(tenant_fields::PROPERTY_ID, tenant.property_id()),
                ),
            )
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(StoreError::PreconditionFailed { ref field, .. }) if field == tenant_fields::STATUS => {
                debug!(tenant_id, "tenant already inactive");
                Ok(false)
            }
            Err(e) => Err(guarded_write_error(e, tenant_id, "tenant was moved by another session")),
        }
    }

    /// Atomic signed delta on a property's occupancy, floored at 0
    async fn adjust_occupancy(&self, property_id: &str, delta: i64) -> Result<Option<u32>, StoreError> {
        let doc = self
            .store
            .update(
                Collection::Properties,
                property_id,
                vec![FieldUpdate::increment_floored(
                    property_fields::OCCUPIED_UNITS,
                    delta,
                    0,
                )],
                None,
            )
            .await?;
        Ok(u32::try_from(doc.int_field(property_fields::OCCUPIED_UNITS)).ok())
    }

    /// Decrement occupancy; a property that no longer exists has nothing to retract
    async fn retract_occupancy(&self, property_id: &str) -> Result<Option<u32>, StoreError> {
        match self.adjust_occupancy(property_id, -1).await {
            Err(StoreError::NotFound { .. }) => {
                warn!(property_id, "property missing while retracting occupancy");
                Ok(None)
            }
            other => other,
        }
    }
}

/// Map a failed guarded tenant write to a ledger error
fn guarded_write_error(err: StoreError, tenant_id: &str, detail: &str) -> LedgerError {
    match err {
        StoreError::PreconditionFailed { .. } => LedgerError::Conflict {
            entity: Entity::Tenant,
            id: tenant_id.to_string(),
            detail: detail.to_string(),
        },
        StoreError::NotFound { .. } => LedgerError::not_found(Entity::Tenant, tenant_id),
        other => other.into(),
    }
}
