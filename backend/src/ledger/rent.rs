//! Rent Batch Charger
//!
//! Adds each active tenant's monthly rent to its balance at most once per
//! billing period.
//!
//! # Idempotency
//!
//! The gate is [`should_charge`] over the period of `lastRentCharged` and the
//! current period. The charge itself is one store write:
//!
//! ```text
//! currentBalance += rentAmount
//! lastRentCharged = <server time>
//! guard: lastRentCharged unchanged since the read
//! ```
//!
//! so two sessions charging the same tenant in the same month cannot both
//! succeed, and re-running a batch only charges tenants it missed.

use crate::core::clock::Clock;
use crate::core::period::{should_charge, BillingPeriod};
use crate::error::{Entity, LedgerError};
use crate::models::tenant::fields as tenant_fields;
use crate::models::{Tenant, TenantStatus};
use crate::repo;
use crate::service::config::ServiceConfig;
use crate::store::{decode, Collection, FieldUpdate, Precondition, Query, RecordStore, StoreError, CREATED_AT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a tenant was not charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "period", rename_all = "snake_case")]
pub enum SkipReason {
    /// Already charged in this period (carries the period of the last charge)
    AlreadyCharged(BillingPeriod),
    Inactive,
}

/// Result of charging one tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChargeOutcome {
    Charged {
        tenant_id: String,
        amount: i64,
        new_balance: i64,
        period: BillingPeriod,
    },
    Skipped {
        tenant_id: String,
        reason: SkipReason,
    },
}

impl ChargeOutcome {
    pub fn is_charged(&self) -> bool {
        matches!(self, ChargeOutcome::Charged { .. })
    }
}

/// A tenant whose charge failed inside a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeFailure {
    pub tenant_id: String,
    pub tenant_name: String,
    pub error: String,
}

/// Summary of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchChargeReport {
    pub period: BillingPeriod,
    pub charged: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Total rent added across charged tenants (i64 cents)
    pub amount_charged: i64,
    pub failures: Vec<ChargeFailure>,
    pub message: String,
}

pub struct RentCharger {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl RentCharger {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        Self { store, clock, config }
    }

    /// Billing period the clock currently falls in
    pub fn current_period(&self) -> BillingPeriod {
        BillingPeriod::containing(self.clock.now(), self.config.utc_offset())
    }

    /// Charge one tenant's rent if it has not been charged this period
    pub async fn charge_one(&self, tenant_id: &str) -> Result<ChargeOutcome, LedgerError> {
        let doc = repo::load_document(&*self.store, Entity::Tenant, tenant_id).await?;
        // The guard compares against the stored value verbatim.
        let last_charged_raw = doc.field(tenant_fields::LAST_RENT_CHARGED).clone();
        let tenant: Tenant = decode(doc)?;

        if !tenant.is_active() {
            return Ok(ChargeOutcome::Skipped {
                tenant_id: tenant_id.to_string(),
                reason: SkipReason::Inactive,
            });
        }

        let period = self.current_period();
        let last = tenant.last_charged_period(self.config.utc_offset());
        if !should_charge(last, period) {
            debug!(tenant_id, %period, "rent already charged");
            return Ok(ChargeOutcome::Skipped {
                tenant_id: tenant_id.to_string(),
                reason: SkipReason::AlreadyCharged(last.unwrap_or(period)),
            });
        }

        let updated = self
            .store
            .update(
                Collection::Tenants,
                tenant_id,
                vec![
                    FieldUpdate::increment(tenant_fields::CURRENT_BALANCE, tenant.rent_amount()),
                    FieldUpdate::server_timestamp(tenant_fields::LAST_RENT_CHARGED),
                ],
                Some(Precondition::field_equals(
                    tenant_fields::LAST_RENT_CHARGED,
                    last_charged_raw,
                )),
            )
            .await
            .map_err(|e| match e {
                StoreError::PreconditionFailed { .. } => LedgerError::Conflict {
                    entity: Entity::Tenant,
                    id: tenant_id.to_string(),
                    detail: "rent charged by another session".to_string(),
                },
                StoreError::NotFound { .. } => LedgerError::not_found(Entity::Tenant, tenant_id),
                other => other.into(),
            })?;

        let new_balance = updated.int_field(tenant_fields::CURRENT_BALANCE);
        info!(
            tenant_id,
            amount = tenant.rent_amount(),
            new_balance,
            %period,
            "rent charged"
        );
        Ok(ChargeOutcome::Charged {
            tenant_id: tenant_id.to_string(),
            amount: tenant.rent_amount(),
            new_balance,
            period,
        })
    }

    /// Charge every active tenant of a landlord
    ///
    /// Tenants are processed one at a time; a failure is recorded and the batch
    /// moves on. Nothing is rolled back.
    pub async fn charge_active_tenants(&self, landlord_id: &str) -> Result<BatchChargeReport, LedgerError> {
        let query = Query::new()
            .where_eq(tenant_fields::LANDLORD_ID, landlord_id)
            .where_eq(tenant_fields::STATUS, TenantStatus::Active.as_str())
            .order_by_asc(CREATED_AT);
        let tenants: Vec<Tenant> = repo::list(&*self.store, Collection::Tenants, &query).await?;
        let period = self.current_period();

        let mut charged = 0;
        let mut skipped = 0;
        let mut amount_charged = 0i64;
        let mut failures = Vec::new();
        for tenant in &tenants {
            match self.charge_one(tenant.id()).await {
                Ok(ChargeOutcome::Charged { amount, .. }) => {
                    charged += 1;
                    amount_charged += amount;
                }
                Ok(ChargeOutcome::Skipped { .. }) => skipped += 1,
                Err(e) => {
                    warn!(tenant_id = tenant.id(), error = %e, "rent charge failed");
                    failures.push(ChargeFailure {
                        tenant_id: tenant.id().to_string(),
                        tenant_name: tenant.full_name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let failed = failures.len();
        let mut message = format!(
            "Successfully charged {} tenant(s). {} failed.",
            charged, failed
        );
        if skipped > 0 {
            message.push_str(&format!(" {} skipped for {}.", skipped, period));
        }
        info!(
            landlord_id,
            %period,
            charged,
            skipped,
            failed,
            amount_charged,
            "rent batch complete"
        );

        Ok(BatchChargeReport {
            period,
            charged,
            skipped,
            failed,
            amount_charged,
            failures,
            message,
        })
    }
}
