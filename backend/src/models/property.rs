//! Property model
//!
//! A rental building owned by one landlord. `total_units` is entered by the
//! landlord; `occupied_units` is derived and only written by the tenant
//! lifecycle manager (atomic deltas) or the occupancy reconciler (full
//! recompute). Property edits never touch it.
//!
//! # Critical Invariant
//!
//! `occupied_units == count(active tenants with property_id == id)`, restorable
//! at any time by reconciliation.

use super::validation::{FieldErrors, ValidationError};
use crate::store::FieldUpdate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored field names
pub mod fields {
    pub const LANDLORD_ID: &str = "landlordId";
    pub const NAME: &str = "name";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const DESCRIPTION: &str = "description";
    pub const TOTAL_UNITS: &str = "totalUnits";
    pub const OCCUPIED_UNITS: &str = "occupiedUnits";
}

/// Registered property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    id: String,
    landlord_id: String,
    name: String,
    address: String,
    city: String,
    #[serde(default)]
    description: Option<String>,
    total_units: u32,
    /// Derived occupancy counter (absent on legacy records = 0)
    #[serde(default)]
    occupied_units: u32,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl Property {
    /// Build a new, empty property from a validated draft
    pub fn new(draft: PropertyDraft, landlord_id: &str) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id: String::new(),
            landlord_id: landlord_id.to_string(),
            name: draft.name.trim().to_string(),
            address: draft.address.trim().to_string(),
            city: draft.city.trim().to_string(),
            description: normalize_optional(draft.description),
            total_units: draft.total_units as u32,
            occupied_units: 0,
            created_at: None,
            updated_at: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn landlord_id(&self) -> &str {
        &self.landlord_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    pub fn occupied_units(&self) -> u32 {
        self.occupied_units
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Units not currently let (never negative, even when over capacity)
    pub fn vacant_units(&self) -> u32 {
        self.total_units.saturating_sub(self.occupied_units)
    }

    /// Whether another tenant fits
    pub fn has_vacancy(&self) -> bool {
        self.occupied_units < self.total_units
    }

    /// Occupancy as a whole percentage, rounded half away from zero
    ///
    /// # Example
    /// ```
    /// use rent_ledger_core_rs::models::{Property, PropertyDraft};
    ///
    /// let draft = PropertyDraft {
    ///     name: "Riverside Court".to_string(),
    ///     address: "12 River Rd".to_string(),
    ///     city: "Nairobi".to_string(),
    ///     total_units: 3,
    ///     description: None,
    /// };
    /// let property = Property::new(draft, "landlord-1").unwrap();
    /// assert_eq!(property.occupancy_rate(), 0);
    /// ```
    pub fn occupancy_rate(&self) -> u32 {
        if self.total_units == 0 {
            return 0;
        }
        (f64::from(self.occupied_units) / f64::from(self.total_units) * 100.0).round() as u32
    }
}

/// Input for registering a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub name: String,
    pub address: String,
    pub city: String,
    pub total_units: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl PropertyDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.require(fields::NAME, &self.name, "Property name is required");
        errors.require(fields::ADDRESS, &self.address, "Address is required");
        errors.require(fields::CITY, &self.city, "City is required");
        check_total_units(&mut errors, self.total_units);
        errors.finish()
    }
}

/// Edit of a property's descriptive fields
///
/// `None` leaves a field unchanged. The occupancy counter is not editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub total_units: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl PropertyUpdate {
    /// Validate against the property being edited
    pub fn validate(&self, current: &Property) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.require(fields::NAME, name, "Property name is required");
        }
        if let Some(address) = &self.address {
            errors.require(fields::ADDRESS, address, "Address is required");
        }
        if let Some(city) = &self.city {
            errors.require(fields::CITY, city, "City is required");
        }
        if let Some(total) = self.total_units {
            check_total_units(&mut errors, total);
            if total >= 1 && total < i64::from(current.occupied_units()) {
                errors.push(
                    fields::TOTAL_UNITS,
                    "Total units cannot be lower than the occupied units",
                );
            }
        }
        errors.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.total_units.is_none()
            && self.description.is_none()
    }

    /// Store writes for the changed fields
    pub fn field_updates(&self) -> Vec<FieldUpdate> {
        let mut updates = Vec::new();
        if let Some(name) = &self.name {
            updates.push(FieldUpdate::set(fields::NAME, name.trim()));
        }
        if let Some(address) = &self.address {
            updates.push(FieldUpdate::set(fields::ADDRESS, address.trim()));
        }
        if let Some(city) = &self.city {
            updates.push(FieldUpdate::set(fields::CITY, city.trim()));
        }
        if let Some(total) = self.total_units {
            updates.push(FieldUpdate::set(fields::TOTAL_UNITS, total));
        }
        if let Some(description) = &self.description {
            updates.push(FieldUpdate::set(
                fields::DESCRIPTION,
                normalize_optional(Some(description.clone())),
            ));
        }
        updates
    }
}

fn check_total_units(errors: &mut FieldErrors, total_units: i64) {
    if total_units < 1 {
        errors.push(fields::TOTAL_UNITS, "Total units must be at least 1");
    } else if total_units > i64::from(u32::MAX) {
        errors.push(fields::TOTAL_UNITS, "Total units is too large");
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
