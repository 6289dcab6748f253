//! Tenant model
//!
//! A tenant is both an occupant (counted in its property's occupancy while
//! `active`) and a ledger entry:
//! - `rent_amount` charged once per billing period (i64 cents)
//! - `current_balance` = rent charged − payments applied (i64 cents)
//!   Positive = owed, negative = credit, zero = settled
//! - `last_rent_charged` marks the billing period of the latest charge
//!
//! CRITICAL: All money values are i64 (cents)

use super::validation::{looks_like_email, FieldErrors, ValidationError};
use crate::core::period::BillingPeriod;
use crate::store::FieldUpdate;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored field names
pub mod fields {
    pub const LANDLORD_ID: &str = "landlordId";
    pub const PROPERTY_ID: &str = "propertyId";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const FULL_NAME: &str = "fullName";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const UNIT_NUMBER: &str = "unitNumber";
    pub const ID_NUMBER: &str = "idNumber";
    pub const MOVE_IN_DATE: &str = "moveInDate";
    pub const RENT_AMOUNT: &str = "rentAmount";
    pub const CURRENT_BALANCE: &str = "currentBalance";
    pub const STATUS: &str = "status";
    pub const LAST_RENT_CHARGED: &str = "lastRentCharged";
}

/// Occupancy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Occupies a unit; counted in occupancy and charged rent
    Active,
    /// Moved out but kept on record
    Inactive,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TenantStatus::Active)
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign of a running balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "standing", content = "amount", rename_all = "lowercase")]
pub enum BalanceStanding {
    /// Tenant owes this many cents
    Owed(i64),
    /// Tenant has prepaid this many cents
    Credit(i64),
    Settled,
}

/// Tenant ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[serde(default)]
    id: String,
    landlord_id: String,
    property_id: String,
    first_name: String,
    last_name: String,
    full_name: String,
    email: String,
    phone: String,
    unit_number: String,
    id_number: String,
    move_in_date: NaiveDate,

    /// Monthly rent (i64 cents)
    rent_amount: i64,

    /// Running balance (i64 cents); absent on legacy records = 0
    #[serde(default)]
    current_balance: i64,

    status: TenantStatus,

    /// Server time of the latest rent charge
    #[serde(default)]
    last_rent_charged: Option<DateTime<Utc>>,

    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl Tenant {
    /// Build a freshly onboarded tenant: active, zero balance, never charged
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use rent_ledger_core_rs::models::{Tenant, TenantDraft, TenantStatus};
    ///
    /// let draft = TenantDraft {
    ///     first_name: "Amina".to_string(),
    ///     last_name: "Otieno".to_string(),
    ///     email: "amina@example.com".to_string(),
    ///     phone: "+254700000001".to_string(),
    ///     property_id: "prop-1".to_string(),
    ///     unit_number: "A1".to_string(),
    ///     rent_amount: 25_000_00,
    ///     move_in_date: NaiveDate::from_ymd_opt(2025, 1, 1),
    ///     id_number: "12345678".to_string(),
    /// };
    /// let tenant = Tenant::new(draft, "landlord-1").unwrap();
    /// assert_eq!(tenant.full_name(), "Amina Otieno");
    /// assert_eq!(tenant.status(), TenantStatus::Active);
    /// assert_eq!(tenant.current_balance(), 0);
    /// assert!(tenant.last_rent_charged().is_none());
    /// ```
    pub fn new(draft: TenantDraft, landlord_id: &str) -> Result<Self, ValidationError> {
        draft.validate()?;
        let Some(move_in_date) = draft.move_in_date else {
            return Err(ValidationError::single(
                fields::MOVE_IN_DATE,
                "Move-in date is required",
            ));
        };
        let first_name = draft.first_name.trim().to_string();
        let last_name = draft.last_name.trim().to_string();
        Ok(Self {
            id: String::new(),
            landlord_id: landlord_id.to_string(),
            property_id: draft.property_id.trim().to_string(),
            full_name: full_name(&first_name, &last_name),
            first_name,
            last_name,
            email: draft.email.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            unit_number: draft.unit_number.trim().to_string(),
            id_number: draft.id_number.trim().to_string(),
            move_in_date,
            rent_amount: draft.rent_amount,
            current_balance: 0,
            status: TenantStatus::Active,
            last_rent_charged: None,
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

    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn unit_number(&self) -> &str {
        &self.unit_number
    }

    pub fn id_number(&self) -> &str {
        &self.id_number
    }

    pub fn move_in_date(&self) -> NaiveDate {
        self.move_in_date
    }

    pub fn rent_amount(&self) -> i64 {
        self.rent_amount
    }

    pub fn current_balance(&self) -> i64 {
        self.current_balance
    }

    pub fn status(&self) -> TenantStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn last_rent_charged(&self) -> Option<DateTime<Utc>> {
        self.last_rent_charged
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Billing period of the latest rent charge, if any
    pub fn last_charged_period(&self, offset: FixedOffset) -> Option<BillingPeriod> {
        self.last_rent_charged
            .map(|at| BillingPeriod::containing(at, offset))
    }

    /// Classify the running balance
    ///
    /// # Example
    /// ```
    /// # use chrono::NaiveDate;
    /// # use rent_ledger_core_rs::models::{BalanceStanding, Tenant, TenantDraft};
    /// # let draft = TenantDraft {
    /// #     first_name: "Amina".to_string(),
    /// #     last_name: "Otieno".to_string(),
    /// #     email: "amina@example.com".to_string(),
    /// #     phone: "+254700000001".to_string(),
    /// #     property_id: "prop-1".to_string(),
    /// #     unit_number: "A1".to_string(),
    /// #     rent_amount: 25_000_00,
    /// #     move_in_date: NaiveDate::from_ymd_opt(2025, 1, 1),
    /// #     id_number: "12345678".to_string(),
    /// # };
    /// let tenant = Tenant::new(draft, "landlord-1").unwrap();
    /// assert_eq!(tenant.balance_standing(), BalanceStanding::Settled);
    /// ```
    pub fn balance_standing(&self) -> BalanceStanding {
        match self.current_balance {
            0 => BalanceStanding::Settled,
            owed if owed > 0 => BalanceStanding::Owed(owed),
            credit => BalanceStanding::Credit(-credit),
        }
    }
}

fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last)
}

/// Onboarding input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub property_id: String,
    pub unit_number: String,
    /// Monthly rent (i64 cents), must be positive
    pub rent_amount: i64,
    #[serde(default)]
    pub move_in_date: Option<NaiveDate>,
    pub id_number: String,
}

impl TenantDraft {
    /// Check every required field, collecting all problems
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.require(fields::FIRST_NAME, &self.first_name, "First name is required");
        errors.require(fields::LAST_NAME, &self.last_name, "Last name is required");
        check_email(&mut errors, &self.email);
        errors.require(fields::PHONE, &self.phone, "Phone number is required");
        errors.require(fields::PROPERTY_ID, &self.property_id, "Property is required");
        errors.require(fields::UNIT_NUMBER, &self.unit_number, "Unit number is required");
        check_rent(&mut errors, self.rent_amount);
        if self.move_in_date.is_none() {
            errors.push(fields::MOVE_IN_DATE, "Move-in date is required");
        }
        errors.require(fields::ID_NUMBER, &self.id_number, "ID number is required");
        errors.finish()
    }
}

/// Edit of a tenant's details
///
/// `None` leaves a field unchanged. A changed `property_id` is a relocation and
/// is applied by the lifecycle manager, not by [`TenantUpdate::field_updates`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub unit_number: Option<String>,
    #[serde(default)]
    pub rent_amount: Option<i64>,
    #[serde(default)]
    pub move_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub id_number: Option<String>,
}

impl TenantUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        if let Some(first) = &self.first_name {
            errors.require(fields::FIRST_NAME, first, "First name is required");
        }
        if let Some(last) = &self.last_name {
            errors.require(fields::LAST_NAME, last, "Last name is required");
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(phone) = &self.phone {
            errors.require(fields::PHONE, phone, "Phone number is required");
        }
        if let Some(property_id) = &self.property_id {
            errors.require(fields::PROPERTY_ID, property_id, "Property is required");
        }
        if let Some(unit) = &self.unit_number {
            errors.require(fields::UNIT_NUMBER, unit, "Unit number is required");
        }
        if let Some(rent) = self.rent_amount {
            check_rent(&mut errors, rent);
        }
        if let Some(id_number) = &self.id_number {
            errors.require(fields::ID_NUMBER, id_number, "ID number is required");
        }
        errors.finish()
    }

    /// Store writes for every changed field except `property_id`
    ///
    /// `full_name` is recomputed from `current` when either name changes.
    pub fn field_updates(&self, current: &Tenant) -> Vec<FieldUpdate> {
        let mut updates = Vec::new();
        let text_fields = [
            (fields::FIRST_NAME, &self.first_name),
            (fields::LAST_NAME, &self.last_name),
            (fields::EMAIL, &self.email),
            (fields::PHONE, &self.phone),
            (fields::UNIT_NUMBER, &self.unit_number),
            (fields::ID_NUMBER, &self.id_number),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                updates.push(FieldUpdate::set(field, value.trim()));
            }
        }

        if self.first_name.is_some() || self.last_name.is_some() {
            let first = self.first_name.as_deref().unwrap_or(current.first_name()).trim();
            let last = self.last_name.as_deref().unwrap_or(current.last_name()).trim();
            updates.push(FieldUpdate::set(fields::FULL_NAME, full_name(first, last)));
        }
        if let Some(rent) = self.rent_amount {
            updates.push(FieldUpdate::set(fields::RENT_AMOUNT, rent));
        }
        if let Some(date) = self.move_in_date {
            updates.push(FieldUpdate::set(fields::MOVE_IN_DATE, date.to_string()));
        }
        updates
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.push(fields::EMAIL, "Email is required");
    } else if !looks_like_email(email) {
        errors.push(fields::EMAIL, "Email is invalid");
    }
}

fn check_rent(errors: &mut FieldErrors, rent_amount: i64) {
    if rent_amount <= 0 {
        errors.push(fields::RENT_AMOUNT, "Rent amount must be greater than 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TenantDraft {
        TenantDraft {
            first_name: " Amina ".to_string(),
            last_name: "Otieno".to_string(),
            email: "amina@example.com".to_string(),
            phone: "+254700000001".to_string(),
            property_id: "prop-1".to_string(),
            unit_number: "A1".to_string(),
            rent_amount: 25_000_00,
            move_in_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            id_number: "12345678".to_string(),
        }
    }

    #[test]
    fn test_names_are_trimmed() {
        let tenant = Tenant::new(draft(), "landlord-1").unwrap();
        assert_eq!(tenant.first_name(), "Amina");
        assert_eq!(tenant.full_name(), "Amina Otieno");
    }

    #[test]
    fn test_balance_standing_credit() {
        let mut tenant = Tenant::new(draft(), "landlord-1").unwrap();
        tenant.current_balance = -500;
        assert_eq!(tenant.balance_standing(), BalanceStanding::Credit(500));
        tenant.current_balance = 700;
        assert_eq!(tenant.balance_standing(), BalanceStanding::Owed(700));
    }

    #[test]
    fn test_update_recomputes_full_name() {
        let tenant = Tenant::new(draft(), "landlord-1").unwrap();
        let update = TenantUpdate {
            last_name: Some("Wanjiru".to_string()),
            ..TenantUpdate::default()
        };
        let writes = update.field_updates(&tenant);
        assert!(writes.contains(&FieldUpdate::set(fields::FULL_NAME, "Amina Wanjiru")));
        assert!(!writes
            .iter()
            .any(|w| matches!(w, FieldUpdate::Set { field, .. } if field == fields::PROPERTY_ID)));
    }
}
