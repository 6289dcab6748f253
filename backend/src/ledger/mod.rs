//! Tenant balances
//!
//! Two writers move `current_balance`, always by atomic delta:
//! - [`PaymentLedger`] credits payments and debits their reversals
//! - [`RentCharger`] debits monthly rent, once per billing period

pub mod payments;
pub mod rent;

pub use payments::{PaymentLedger, PaymentReceipt, PaymentReversal, PaymentStats};
pub use rent::{BatchChargeReport, ChargeFailure, ChargeOutcome, RentCharger, SkipReason};
