//! Payment model
//!
//! A payment is a monetary event credited against a tenant's balance. Once
//! stored it is never edited; removing it is a compensating action that
//! reverses its balance effect.
//!
//! CRITICAL: All money values are i64 (cents)

use super::validation::{FieldErrors, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored field names
pub mod fields {
    pub const TENANT_ID: &str = "tenantId";
    pub const PROPERTY_ID: &str = "propertyId";
    pub const LANDLORD_ID: &str = "landlordId";
    pub const AMOUNT: &str = "amount";
    pub const METHOD: &str = "method";
    pub const REFERENCE_ID: &str = "referenceId";
    pub const PAYMENT_DATE: &str = "paymentDate";
    pub const NOTES: &str = "notes";
}

/// How the money arrived
///
/// `mpesa` is accepted on input as the legacy label for mobile transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Cash,
    #[serde(alias = "mpesa")]
    MobileTransfer,
    Bank,
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileTransfer => "mobile-transfer",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Cheque => "cheque",
        }
    }

    /// Whether a provider reference id must accompany the payment
    pub fn requires_reference(&self) -> bool {
        match self {
            PaymentMethod::MobileTransfer => true,
            PaymentMethod::Cash | PaymentMethod::Bank | PaymentMethod::Cheque => false,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment lifecycle; every stored payment is completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
}

/// Stored payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    id: String,
    tenant_id: String,
    property_id: String,
    landlord_id: String,
    /// Amount paid (i64 cents), always positive
    amount: i64,
    method: PaymentMethod,
    #[serde(default)]
    reference_id: Option<String>,
    payment_date: NaiveDate,
    #[serde(default)]
    notes: Option<String>,
    status: PaymentStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Build a payment from a validated draft
    ///
    /// `property_id` is the resolved owning property (the draft's, or the
    /// tenant's when the draft leaves it blank).
    pub fn new(
        draft: PaymentDraft,
        property_id: &str,
        landlord_id: &str,
    ) -> Result<Self, ValidationError> {
        draft.validate()?;
        let Some(payment_date) = draft.payment_date else {
            return Err(ValidationError::single(
                fields::PAYMENT_DATE,
                "Payment date is required",
            ));
        };
        Ok(Self {
            id: String::new(),
            tenant_id: draft.tenant_id.trim().to_string(),
            property_id: property_id.to_string(),
            landlord_id: landlord_id.to_string(),
            amount: draft.amount,
            method: draft.method,
            reference_id: non_blank(draft.reference_id),
            payment_date,
            notes: non_blank(draft.notes),
            status: PaymentStatus::Completed,
            created_at: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    pub fn landlord_id(&self) -> &str {
        &self.landlord_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn reference_id(&self) -> Option<&str> {
        self.reference_id.as_deref()
    }

    pub fn payment_date(&self) -> NaiveDate {
        self.payment_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Payment entry input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub tenant_id: String,
    /// Defaults to the tenant's property when absent
    #[serde(default)]
    pub property_id: Option<String>,
    /// Amount paid (i64 cents), must be positive
    pub amount: i64,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentDraft {
    /// Check required fields and the per-method rules
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use rent_ledger_core_rs::models::{PaymentDraft, PaymentMethod};
    ///
    /// let draft = PaymentDraft {
    ///     tenant_id: "tenant-1".to_string(),
    ///     property_id: None,
    ///     amount: 25_000_00,
    ///     method: PaymentMethod::MobileTransfer,
    ///     reference_id: None,
    ///     payment_date: NaiveDate::from_ymd_opt(2025, 3, 5),
    ///     notes: None,
    /// };
    /// let err = draft.validate().unwrap_err();
    /// assert!(err.has_field("referenceId"));
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        errors.require(fields::TENANT_ID, &self.tenant_id, "Please select a tenant");
        if self.amount <= 0 {
            errors.push(fields::AMOUNT, "Amount must be greater than 0");
        }
        if self.payment_date.is_none() {
            errors.push(fields::PAYMENT_DATE, "Payment date is required");
        }
        if self.method.requires_reference()
            && self
                .reference_id
                .as_deref()
                .map_or(true, |r| r.trim().is_empty())
        {
            errors.push(
                fields::REFERENCE_ID,
                "Reference id is required for mobile transfers",
            );
        }
        errors.finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpesa_alias_parses_as_mobile_transfer() {
        let method: PaymentMethod = serde_json::from_str("\"mpesa\"").unwrap();
        assert_eq!(method, PaymentMethod::MobileTransfer);
        assert_eq!(
            serde_json::to_string(&method).unwrap(),
            "\"mobile-transfer\""
        );
    }

    #[test]
    fn test_only_mobile_transfer_requires_reference() {
        assert!(PaymentMethod::MobileTransfer.requires_reference());
        assert!(!PaymentMethod::Cash.requires_reference());
        assert!(!PaymentMethod::Bank.requires_reference());
        assert!(!PaymentMethod::Cheque.requires_reference());
    }

    #[test]
    fn test_blank_notes_dropped() {
        let draft = PaymentDraft {
            tenant_id: "tenant-1".to_string(),
            property_id: None,
            amount: 100,
            method: PaymentMethod::Cash,
            reference_id: Some("   ".to_string()),
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 5),
            notes: Some(" ".to_string()),
        };
        let payment = Payment::new(draft, "prop-1", "landlord-1").unwrap();
        assert_eq!(payment.notes(), None);
        assert_eq!(payment.reference_id(), None);
        assert_eq!(payment.status(), PaymentStatus::Completed);
    }
}
