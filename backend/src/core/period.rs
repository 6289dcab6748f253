//! Billing periods
//!
//! Rent is charged at most once per calendar month. A billing period is the
//! `(year, month)` pair a timestamp falls into, evaluated at a fixed UTC offset
//! so that landlords east or west of UTC see month boundaries at local midnight.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A month outside `1..=12`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid billing month {month} (expected 1..=12)")]
pub struct InvalidPeriod {
    pub month: u32,
}

/// Calendar `(year, month)` unit used to gate rent charging
///
/// Ordering is chronological: year first, then month.
///
/// # Example
/// ```
/// use rent_ledger_core_rs::BillingPeriod;
///
/// let march = BillingPeriod::new(2025, 3);
/// let april = march.next();
/// assert_eq!(april, BillingPeriod::new(2025, 4));
/// assert!(april > march);
/// assert_eq!(BillingPeriod::new(2025, 12).next(), BillingPeriod::new(2026, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct BillingPeriod {
    year: i32,
    /// 1-based month (1 = January)
    month: u32,
}

impl BillingPeriod {
    /// Create a period
    ///
    /// # Panics
    /// Panics if `month` is not in `1..=12`
    pub fn new(year: i32, month: u32) -> Self {
        assert!((1..=12).contains(&month), "month must be in 1..=12");
        Self { year, month }
    }

    /// Create a period, rejecting months outside `1..=12`
    pub fn try_new(year: i32, month: u32) -> Result<Self, InvalidPeriod> {
        if (1..=12).contains(&month) {
            Ok(Self { year, month })
        } else {
            Err(InvalidPeriod { month })
        }
    }

    /// Period containing `at`, observed at `offset` from UTC
    ///
    /// # Example
    /// ```
    /// use chrono::{FixedOffset, TimeZone, Utc};
    /// use rent_ledger_core_rs::BillingPeriod;
    ///
    /// // 22:30 UTC on 31 January is already 1 February in Nairobi (UTC+3)
    /// let at = Utc.with_ymd_and_hms(2025, 1, 31, 22, 30, 0).unwrap();
    /// let nairobi = FixedOffset::east_opt(3 * 3600).unwrap();
    /// assert_eq!(BillingPeriod::containing(at, nairobi), BillingPeriod::new(2025, 2));
    /// ```
    pub fn containing(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = at.with_timezone(&offset);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

/// Wire shape, checked before it becomes a [`BillingPeriod`]
#[derive(Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for BillingPeriod {
    type Error = InvalidPeriod;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        BillingPeriod::try_new(raw.year, raw.month)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Decide whether rent may be charged in `current`
///
/// Returns `true` when nothing has been charged yet, or when `current` is a
/// strictly later period than the last charge. A last charge in the same or a
/// later period (clock skew) blocks the charge.
///
/// # Example
/// ```
/// use rent_ledger_core_rs::{should_charge, BillingPeriod};
///
/// let may = BillingPeriod::new(2025, 5);
/// assert!(should_charge(None, may));
/// assert!(!should_charge(Some(may), may));
/// assert!(should_charge(Some(may), may.next()));
/// ```
pub fn should_charge(last_charged: Option<BillingPeriod>, current: BillingPeriod) -> bool {
    match last_charged {
        None => true,
        Some(last) => current > last,
    }
}
