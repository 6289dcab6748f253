//! Payment Ledger
//!
//! Records payments against tenant balances and reverses them on deletion.
//!
//! # Balance Flow
//!
//! ```text
//! record:  create payment ──▶ tenant.currentBalance -= amount
//! reverse: delete payment ──▶ tenant.currentBalance += amount
//! ```
//!
//! Both balance writes are atomic deltas. A reversal is applied only by the
//! caller whose delete removed the payment. A tenant that vanished between
//! the two writes is a soft warning, not an error: the payment record stands
//! (or stays deleted) and the outcome carries the warning.

use crate::core::clock::Clock;
use crate::core::period::BillingPeriod;
use crate::error::{Entity, LedgerError};
use crate::models::payment::fields as payment_fields;
use crate::models::tenant::fields as tenant_fields;
use crate::models::{Payment, PaymentDraft};
use crate::repo;
use crate::service::config::ServiceConfig;
use crate::store::{decode, encode, Collection, FieldUpdate, Query, RecordStore, StoreError, CREATED_AT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: String,
    /// Tenant balance after the credit; `None` when the tenant was gone
    pub new_balance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Result of reversing (deleting) a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReversal {
    pub payment_id: String,
    pub tenant_id: String,
    pub amount: i64,
    pub new_balance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Revenue summary over a landlord's payments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStats {
    /// Sum of every payment (i64 cents)
    pub total_revenue: i64,
    /// Sum of payments recorded in the current billing period (i64 cents)
    pub period_revenue: i64,
    pub total_payments: usize,
    pub period: BillingPeriod,
}

pub struct PaymentLedger {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl PaymentLedger {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        Self { store, clock, config }
    }

    /// Persist a payment and credit it against the tenant's balance
    ///
    /// The tenant, and an explicit property if one is given, must belong to
    /// `landlord_id`; anything else is `NotFound`.
    pub async fn record(&self, draft: PaymentDraft, landlord_id: &str) -> Result<PaymentReceipt, LedgerError> {
        draft.validate()?;
        let tenant = repo::load_owned_tenant(&*self.store, draft.tenant_id.trim(), landlord_id).await?;
        let property_id = match draft.property_id.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() && p != tenant.property_id() => {
                repo::load_owned_property(&*self.store, p, landlord_id).await?;
                p.to_string()
            }
            _ => tenant.property_id().to_string(),
        };

        let payment = Payment::new(draft, &property_id, landlord_id)?;
        let doc = self
            .store
            .create(Collection::Payments, encode(&payment)?)
            .await?;
        info!(
            payment_id = %doc.id,
            tenant_id = payment.tenant_id(),
            amount = payment.amount(),
            method = %payment.method(),
            "payment recorded"
        );

        let credited = self
            .apply_to_balance(payment.tenant_id(), -payment.amount())
            .await
            .map_err(|e| LedgerError::Incomplete {
                operation: "record_payment",
                detail: format!(
                    "payment {} stored but tenant {} balance not credited ({})",
                    doc.id,
                    payment.tenant_id(),
                    e
                ),
            })?;

        Ok(PaymentReceipt {
            payment_id: doc.id,
            new_balance: credited.balance,
            warning: credited.warning,
        })
    }

    /// Delete a payment and restore the tenant's balance
    pub async fn reverse(&self, payment_id: &str) -> Result<PaymentReversal, LedgerError> {
        let Some(doc) = self.store.delete(Collection::Payments, payment_id).await? else {
            return Err(LedgerError::not_found(Entity::Payment, payment_id));
        };
        let payment: Payment = decode(doc)?;
        info!(payment_id, tenant_id = payment.tenant_id(), "payment deleted");

        let restored = self
            .apply_to_balance(payment.tenant_id(), payment.amount())
            .await
            .map_err(|e| LedgerError::Incomplete {
                operation: "delete_payment",
                detail: format!(
                    "payment {} deleted but tenant {} balance not restored ({})",
                    payment_id,
                    payment.tenant_id(),
                    e
                ),
            })?;
        info!(
            payment_id,
            amount = payment.amount(),
            new_balance = ?restored.balance,
            "payment reversed"
        );

        Ok(PaymentReversal {
            payment_id: payment_id.to_string(),
            tenant_id: payment.tenant_id().to_string(),
            amount: payment.amount(),
            new_balance: restored.balance,
            warning: restored.warning,
        })
    }

    pub async fn get(&self, payment_id: &str) -> Result<Payment, LedgerError> {
        repo::load_payment(&*self.store, payment_id).await
    }

    /// Tenant's payments, most recent first
    pub async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Payment>, LedgerError> {
        self.list(payment_fields::TENANT_ID, tenant_id).await
    }

    /// Property's payments, most recent first
    pub async fn list_by_property(&self, property_id: &str) -> Result<Vec<Payment>, LedgerError> {
        self.list(payment_fields::PROPERTY_ID, property_id).await
    }

    /// Landlord's payments, most recent first
    pub async fn list_by_landlord(&self, landlord_id: &str) -> Result<Vec<Payment>, LedgerError> {
        self.list(payment_fields::LANDLORD_ID, landlord_id).await
    }

    /// Revenue totals; the current period is judged by each payment's `createdAt`
    pub async fn stats(&self, landlord_id: &str) -> Result<PaymentStats, LedgerError> {
        let payments = self.list_by_landlord(landlord_id).await?;
        let offset = self.config.utc_offset();
        let period = BillingPeriod::containing(self.clock.now(), offset);

        let total_revenue = payments.iter().map(Payment::amount).sum();
        let period_revenue = payments
            .iter()
            .filter(|p| {
                p.created_at()
                    .map_or(false, |at| BillingPeriod::containing(at, offset) == period)
            })
            .map(Payment::amount)
            .sum();

        Ok(PaymentStats {
            total_revenue,
            period_revenue,
            total_payments: payments.len(),
            period,
        })
    }

    async fn list(&self, field: &str, value: &str) -> Result<Vec<Payment>, LedgerError> {
        let query = Query::new().where_eq(field, value).order_by_desc(CREATED_AT);
        repo::list(&*self.store, Collection::Payments, &query).await
    }

    /// Atomic delta on a tenant's balance; a missing tenant becomes a warning
    async fn apply_to_balance(&self, tenant_id: &str, delta: i64) -> Result<BalanceEffect, StoreError> {
        let result = self
            .store
            .update(
                Collection::Tenants,
                tenant_id,
                vec![FieldUpdate::increment(tenant_fields::CURRENT_BALANCE, delta)],
                None,
            )
            .await;
        match result {
            Ok(doc) => Ok(BalanceEffect {
                balance: Some(doc.int_field(tenant_fields::CURRENT_BALANCE)),
                warning: None,
            }),
            Err(StoreError::NotFound { .. }) => {
                warn!(tenant_id, delta, "tenant missing, balance not adjusted");
                Ok(BalanceEffect {
                    balance: None,
                    warning: Some(format!(
                        "Tenant {} no longer exists; balance not adjusted",
                        tenant_id
                    )),
                })
            }
            Err(e) => Err(e),
        }
    }
}

struct BalanceEffect {
    balance: Option<i64>,
    warning: Option<String>,
}
