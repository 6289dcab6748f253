//! Property registry
//!
//! Registration, edits and removal of properties. New properties start with
//! zero occupancy; edits go through [`PropertyUpdate`], which cannot reach the
//! occupancy counter.

use crate::error::{Entity, LedgerError};
use crate::models::property::fields as property_fields;
use crate::models::tenant::fields as tenant_fields;
use crate::models::{Property, PropertyDraft, PropertyUpdate, TenantStatus};
use crate::repo;
use crate::store::{decode, encode, Collection, Query, RecordStore, StoreError, CREATED_AT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of removing a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRemoval {
    pub property_id: String,
    /// Active tenants still pointing at the removed property
    pub orphaned_tenants: Vec<String>,
}

pub struct PropertyRegistry {
    store: Arc<dyn RecordStore>,
}

impl PropertyRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Register a property for `landlord_id`, returning its id
    pub async fn register(&self, draft: PropertyDraft, landlord_id: &str) -> Result<String, LedgerError> {
        let property = Property::new(draft, landlord_id)?;
        let doc = self
            .store
            .create(Collection::Properties, encode(&property)?)
            .await?;
        info!(
            property_id = %doc.id,
            landlord_id,
            total_units = property.total_units(),
            "property registered"
        );
        Ok(doc.id)
    }

    /// Edit descriptive fields and capacity
    pub async fn update(&self, property_id: &str, update: PropertyUpdate) -> Result<Property, LedgerError> {
        let current = repo::load_property(&*self.store, property_id).await?;
        update.validate(&current)?;
        if update.is_empty() {
            return Ok(current);
        }
        let doc = self
            .store
            .update(Collection::Properties, property_id, update.field_updates(), None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => {
                    LedgerError::not_found(Entity::Property, property_id)
                }
                other => other.into(),
            })?;
        info!(property_id, "property updated");
        Ok(decode(doc)?)
    }

    /// Delete a property
    ///
    /// Tenants still assigned to it are left untouched and reported; the
    /// reconciler lists them as orphans until they are relocated or offboarded.
    pub async fn remove(&self, property_id: &str) -> Result<PropertyRemoval, LedgerError> {
        let Some(_) = self.store.delete(Collection::Properties, property_id).await? else {
            return Err(LedgerError::not_found(Entity::Property, property_id));
        };

        let query = Query::new()
            .where_eq(tenant_fields::PROPERTY_ID, property_id)
            .where_eq(tenant_fields::STATUS, TenantStatus::Active.as_str());
        let orphaned_tenants: Vec<String> = self
            .store
            .query(Collection::Tenants, &query)
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect();

        if orphaned_tenants.is_empty() {
            info!(property_id, "property removed");
        } else {
            warn!(
                property_id,
                orphaned = orphaned_tenants.len(),
                "property removed with active tenants still assigned"
            );
        }

        Ok(PropertyRemoval {
            property_id: property_id.to_string(),
            orphaned_tenants,
        })
    }

    pub async fn get(&self, property_id: &str) -> Result<Property, LedgerError> {
        repo::load_property(&*self.store, property_id).await
    }

    /// Landlord's properties, oldest first
    pub async fn list_by_landlord(&self, landlord_id: &str) -> Result<Vec<Property>, LedgerError> {
        let query = Query::new()
            .where_eq(property_fields::LANDLORD_ID, landlord_id)
            .order_by_asc(CREATED_AT);
        repo::list(&*self.store, Collection::Properties, &query).await
    }
}
