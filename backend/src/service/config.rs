//! Service configuration
//!
//! Loaded from JSON (or built in code) and validated once when the service is
//! constructed. Every field has a default, so `{}` is a valid config.

use crate::store::snapshot::compute_digest;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest UTC offset accepted for billing periods (±18h, chrono's bound)
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Config parse failed: {0}")]
    Parse(String),
}

/// What offboarding does to the tenant record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffboardMode {
    /// Remove the tenant document
    #[default]
    Delete,
    /// Keep the document with `status = inactive`
    MarkInactive,
}

/// Ledger service settings
///
/// # Example
/// ```
/// use rent_ledger_core_rs::{OffboardMode, ServiceConfig};
///
/// let config = ServiceConfig::from_json(r#"{"offboard_mode": "mark_inactive"}"#).unwrap();
/// assert_eq!(config.offboard_mode, OffboardMode::MarkInactive);
/// assert_eq!(config.currency, "KES");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Display label for amounts (amounts themselves are i64 cents)
    pub currency: String,

    pub offboard_mode: OffboardMode,

    /// Offset from UTC, in minutes, at which calendar months are evaluated
    pub billing_utc_offset_minutes: i32,

    /// Reject onboarding/relocation into a property with no vacant units
    pub enforce_capacity: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            currency: "KES".to_string(),
            offboard_mode: OffboardMode::Delete,
            billing_utc_offset_minutes: 0,
            enforce_capacity: false,
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be blank".to_string()));
        }
        if self.billing_utc_offset_minutes.abs() >= MAX_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "billing_utc_offset_minutes must be within ±{} (got {})",
                MAX_OFFSET_MINUTES - 1,
                self.billing_utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// Offset used to derive billing periods
    pub fn utc_offset(&self) -> FixedOffset {
        // validate() keeps the offset inside chrono's accepted range
        FixedOffset::east_opt(self.billing_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// SHA-256 of the canonical JSON form, for diagnostics
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        compute_digest(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(ServiceConfig::from_json("{}").unwrap(), ServiceConfig::default());
    }

    #[test]
    fn test_out_of_range_offset_rejected() {
        let config = ServiceConfig {
            billing_utc_offset_minutes: 24 * 60,
            ..ServiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_blank_currency_rejected() {
        let err = ServiceConfig::from_json(r#"{"currency": " "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_offset_applied() {
        let config = ServiceConfig {
            billing_utc_offset_minutes: 180,
            ..ServiceConfig::default()
        };
        assert_eq!(config.utc_offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_fingerprint_changes_with_settings() {
        let a = ServiceConfig::default();
        let b = ServiceConfig {
            enforce_capacity: true,
            ..ServiceConfig::default()
        };
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
