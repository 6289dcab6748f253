//! Time and billing-period primitives

pub mod clock;
pub mod period;

pub use clock::{Clock, FixedClock, SystemClock};
pub use period::{should_charge, BillingPeriod, InvalidPeriod};
