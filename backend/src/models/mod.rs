//! Domain models for the rental ledger

pub mod payment;
pub mod property;
pub mod tenant;
pub mod validation;

// Re-exports
pub use payment::{Payment, PaymentDraft, PaymentMethod, PaymentStatus};
pub use property::{Property, PropertyDraft, PropertyUpdate};
pub use tenant::{BalanceStanding, Tenant, TenantDraft, TenantStatus, TenantUpdate};
pub use validation::{FieldError, ValidationError};
