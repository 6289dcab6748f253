//! Occupancy reconciliation
//!
//! Recomputes each property's `occupied_units` from the set of active tenants
//! assigned to it. This is the repair path for every partial failure in the
//! lifecycle manager.
//!
//! Counts are written with a plain overwrite, so running twice yields the same
//! values. A lifecycle write landing between the count and the overwrite can be
//! lost; the next run picks it up.

use crate::error::LedgerError;
use crate::models::property::fields as property_fields;
use crate::models::tenant::fields as tenant_fields;
use crate::models::{Property, Tenant};
use crate::repo;
use crate::store::{Collection, FieldUpdate, Query, RecordStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Recorded vs. actual occupancy of one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyDrift {
    pub property_id: String,
    pub property_name: String,
    pub recorded: u32,
    pub actual: u32,
}

/// Read-only view of the landlord's occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyAudit {
    pub properties_checked: usize,
    /// Active-tenant count per property id
    pub occupancy: BTreeMap<String, u32>,
    /// Properties whose recorded counter disagrees with the count
    pub drift: Vec<OccupancyDrift>,
    /// Active tenants whose property is not among the landlord's properties
    pub orphaned_tenants: Vec<String>,
}

impl OccupancyAudit {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty()
    }
}

/// A property whose counter could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileFailure {
    pub property_id: String,
    pub error: String,
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub audit: OccupancyAudit,
    pub properties_updated: usize,
    pub failures: Vec<ReconcileFailure>,
    pub message: String,
}

pub struct OccupancyReconciler {
    store: Arc<dyn RecordStore>,
}

impl OccupancyReconciler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Compare recorded occupancy with active-tenant counts, writing nothing
    pub async fn detect_drift(&self, landlord_id: &str) -> Result<OccupancyAudit, LedgerError> {
        let properties: Vec<Property> = repo::list(
            &*self.store,
            Collection::Properties,
            &Query::new().where_eq(property_fields::LANDLORD_ID, landlord_id),
        )
        .await?;
        let tenants: Vec<Tenant> = repo::list(
            &*self.store,
            Collection::Tenants,
            &Query::new().where_eq(tenant_fields::LANDLORD_ID, landlord_id),
        )
        .await?;

        let audit = audit(&properties, &tenants);
        for drift in &audit.drift {
            warn!(
                property_id = %drift.property_id,
                recorded = drift.recorded,
                actual = drift.actual,
                "occupancy drift"
            );
        }
        if !audit.orphaned_tenants.is_empty() {
            warn!(
                landlord_id,
                orphans = audit.orphaned_tenants.len(),
                "active tenants reference unknown properties"
            );
        }
        Ok(audit)
    }

    /// Overwrite every property's occupancy with its active-tenant count
    ///
    /// Properties are written independently; one failed write is reported and
    /// the rest still proceed.
    pub async fn reconcile(&self, landlord_id: &str) -> Result<ReconcileReport, LedgerError> {
        let audit = self.detect_drift(landlord_id).await?;

        let mut properties_updated = 0;
        let mut failures = Vec::new();
        for (property_id, count) in &audit.occupancy {
            let write = FieldUpdate::set(property_fields::OCCUPIED_UNITS, *count);
            match self
                .store
                .update(Collection::Properties, property_id, vec![write], None)
                .await
            {
                Ok(_) => properties_updated += 1,
                Err(e) => {
                    warn!(property_id = %property_id, error = %e, "occupancy overwrite failed");
                    failures.push(ReconcileFailure {
                        property_id: property_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let message = if failures.is_empty() {
            format!("Updated {} properties", properties_updated)
        } else {
            format!(
                "Updated {} properties. {} failed.",
                properties_updated,
                failures.len()
            )
        };
        info!(
            landlord_id,
            properties_updated,
            drifted = audit.drift.len(),
            failed = failures.len(),
            "occupancy reconciled"
        );

        Ok(ReconcileReport {
            audit,
            properties_updated,
            failures,
            message,
        })
    }
}

/// Pure occupancy computation over one landlord's records
fn audit(properties: &[Property], tenants: &[Tenant]) -> OccupancyAudit {
    let mut occupancy: BTreeMap<String, u32> = properties
        .iter()
        .map(|p| (p.id().to_string(), 0))
        .collect();

    let mut orphaned_tenants = Vec::new();
    for tenant in tenants.iter().filter(|t| t.is_active()) {
        match occupancy.get_mut(tenant.property_id()) {
            Some(count) => *count += 1,
            None => orphaned_tenants.push(tenant.id().to_string()),
        }
    }

    let drift = properties
        .iter()
        .filter_map(|p| {
            let actual = occupancy.get(p.id()).copied().unwrap_or(0);
            (p.occupied_units() != actual).then(|| OccupancyDrift {
                property_id: p.id().to_string(),
                property_name: p.name().to_string(),
                recorded: p.occupied_units(),
                actual,
            })
        })
        .collect();

    OccupancyAudit {
        properties_checked: properties.len(),
        occupancy,
        drift,
        orphaned_tenants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyDraft, TenantDraft};
    use crate::store::{decode, encode};
    use chrono::NaiveDate;

    fn property(id: &str, occupied: u32) -> Property {
        let draft = PropertyDraft {
            name: format!("Block {}", id),
            address: "1 Moi Avenue".to_string(),
            city: "Nairobi".to_string(),
            total_units: 10,
            description: None,
        };
        let mut fields = encode(&Property::new(draft, "landlord-1").unwrap()).unwrap();
        fields.insert(property_fields::OCCUPIED_UNITS.to_string(), occupied.into());
        decode(crate::store::Document {
            id: id.to_string(),
            fields,
        })
        .unwrap()
    }

    fn tenant(id: &str, property_id: &str, active: bool) -> Tenant {
        let draft = TenantDraft {
            first_name: "Jo".to_string(),
            last_name: "Kamau".to_string(),
            email: "jo@example.com".to_string(),
            phone: "0700".to_string(),
            property_id: property_id.to_string(),
            unit_number: "1".to_string(),
            rent_amount: 100,
            move_in_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            id_number: "1".to_string(),
        };
        let mut fields = encode(&Tenant::new(draft, "landlord-1").unwrap()).unwrap();
        if !active {
            fields.insert(tenant_fields::STATUS.to_string(), "inactive".into());
        }
        decode(crate::store::Document {
            id: id.to_string(),
            fields,
        })
        .unwrap()
    }

    #[test]
    fn test_audit_counts_only_active_tenants() {
        let properties = vec![property("p1", 5), property("p2", 0)];
        let tenants = vec![
            tenant("t1", "p1", true),
            tenant("t2", "p1", false),
            tenant("t3", "p2", true),
            tenant("t4", "gone", true),
        ];

        let audit = audit(&properties, &tenants);
        assert_eq!(audit.occupancy["p1"], 1);
        assert_eq!(audit.occupancy["p2"], 1);
        assert_eq!(audit.orphaned_tenants, vec!["t4".to_string()]);
        assert_eq!(audit.drift.len(), 2);
        assert_eq!(audit.drift[0].recorded, 5);
        assert_eq!(audit.drift[0].actual, 1);
    }

    #[test]
    fn test_audit_consistent_when_counts_match() {
        let audit = audit(&[property("p1", 1)], &[tenant("t1", "p1", true)]);
        assert!(audit.is_consistent());
    }
}
