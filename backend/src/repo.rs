//! Typed reads over the record store

use crate::error::{Entity, LedgerError};
use crate::models::{Payment, Property, Tenant};
use crate::store::{decode, Collection, Document, Query, RecordStore};
use serde::de::DeserializeOwned;

pub(crate) async fn load_document(
    store: &dyn RecordStore,
    entity: Entity,
    id: &str,
) -> Result<Document, LedgerError> {
    store
        .get(collection_of(entity), id)
        .await?
        .ok_or_else(|| LedgerError::not_found(entity, id))
}

pub(crate) async fn load_property(store: &dyn RecordStore, id: &str) -> Result<Property, LedgerError> {
    Ok(decode(load_document(store, Entity::Property, id).await?)?)
}

pub(crate) async fn load_tenant(store: &dyn RecordStore, id: &str) -> Result<Tenant, LedgerError> {
    Ok(decode(load_document(store, Entity::Tenant, id).await?)?)
}

/// Load a property only if `landlord_id` owns it
///
/// Another landlord's property is reported exactly like a missing one.
pub(crate) async fn load_owned_property(
    store: &dyn RecordStore,
    id: &str,
    landlord_id: &str,
) -> Result<Property, LedgerError> {
    let property = load_property(store, id).await?;
    if property.landlord_id() != landlord_id {
        return Err(LedgerError::not_found(Entity::Property, id));
    }
    Ok(property)
}

pub(crate) async fn load_owned_tenant(
    store: &dyn RecordStore,
    id: &str,
    landlord_id: &str,
) -> Result<Tenant, LedgerError> {
    let tenant = load_tenant(store, id).await?;
    if tenant.landlord_id() != landlord_id {
        return Err(LedgerError::not_found(Entity::Tenant, id));
    }
    Ok(tenant)
}

pub(crate) async fn load_payment(store: &dyn RecordStore, id: &str) -> Result<Payment, LedgerError> {
    Ok(decode(load_document(store, Entity::Payment, id).await?)?)
}

/// Run a query and decode every hit
pub(crate) async fn list<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    query: &Query,
) -> Result<Vec<T>, LedgerError> {
    store
        .query(collection, query)
        .await?
        .into_iter()
        .map(|doc| decode(doc).map_err(LedgerError::from))
        .collect()
}

pub(crate) fn collection_of(entity: Entity) -> Collection {
    match entity {
        Entity::Property => Collection::Properties,
        Entity::Tenant => Collection::Tenants,
        Entity::Payment => Collection::Payments,
    }
}
