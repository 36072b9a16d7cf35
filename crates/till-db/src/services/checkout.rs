//! # Checkout
//!
//! Finalises a sale: totals, tender validation, then one transaction for
//! the sale header, its payments and its cash movements.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. SaleTotals::compute        clamp discount, grand total             │
//! │  2. tender fallback            no methods → [fallback, tendered|total] │
//! │  3. settle_payment             parse → allocate → primary method       │
//! │        └── any rejection here: nothing has been written                │
//! │  4. BEGIN                                                               │
//! │     ├── require_open_session?  no OPEN session → NotOpen               │
//! │     ├── next sale code         YYYYMMDD-NNNNN                          │
//! │     ├── INSERT sale                                                     │
//! │     └── SalePaymentRecorder::record  (same transaction)                │
//! │     COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ServiceResult, ServiceError};
use crate::pool::Database;
use crate::recorder::SalePaymentRecorder;
use crate::repository::{SaleRepository, SessionRepository};
use till_core::validation::validate_optional_text;
use till_core::{
    settle_payment, Actor, Allocation, CoreError, Money, PaymentCatalog, PaymentMethodCode, Sale,
    SaleAmounts, SaleTotals, SessionError,
};

/// Everything the register submits for one sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub company_id: String,
    pub amounts: SaleAmounts,
    /// Raw tender methods, paired by position with `payment_amounts`.
    pub payment_methods: Vec<String>,
    pub payment_amounts: Vec<String>,
    /// Method used when `payment_methods` is empty. Defaults to the
    /// catalog's fallback method.
    pub fallback_method: Option<String>,
    /// Amount used when `payment_methods` is empty. Defaults to the grand
    /// total.
    pub tendered_amount: Option<String>,
    pub customer_name: Option<String>,
    pub delivery_address: Option<String>,
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub sale: Sale,
    pub allocations: Vec<Allocation>,
    pub tendered_total: Money,
    pub change_total: Money,
    pub primary_method: PaymentMethodCode,
    /// Session the movements went to; `None` when no drawer was open.
    pub session_id: Option<String>,
    pub movements_posted: usize,
}

/// One line of a sale's payment summary.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummaryLine {
    pub method: PaymentMethodCode,
    pub label: String,
    pub tendered: Money,
    pub applied: Money,
    pub change: Money,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: String,
}

/// Checkout use case.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    catalog: PaymentCatalog,
    recorder: SalePaymentRecorder,
    require_open_session: bool,
}

impl CheckoutService {
    pub fn new(db: Database, catalog: PaymentCatalog) -> Self {
        let recorder = SalePaymentRecorder::new(db.clone(), catalog.clone());
        CheckoutService {
            db,
            catalog,
            recorder,
            require_open_session: false,
        }
    }

    /// Reject sales while the company has no open drawer.
    pub fn require_open_session(mut self, required: bool) -> Self {
        self.require_open_session = required;
        self
    }

    /// Finalises a sale. See the module docs for the flow.
    pub async fn checkout(
        &self,
        request: CheckoutRequest,
        actor: &Actor,
    ) -> ServiceResult<CheckoutReceipt> {
        let totals = SaleTotals::compute(request.amounts.clone())?;
        let customer_name = validate_optional_text("customer_name", request.customer_name.as_deref())?;
        let delivery_address =
            validate_optional_text("delivery_address", request.delivery_address.as_deref())?;

        let (methods, amounts) = self.tender_lines(&request, totals.grand_total);
        let settlement = settle_payment(&self.catalog, Some(totals.grand_total), &methods, &amounts)
            .map_err(|err| {
                warn!(company_id = %request.company_id, error = %err, "Tender rejected");
                ServiceError::from(err)
            })?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        if self.require_open_session
            && SessionRepository::find_open_in(&mut tx, &request.company_id)
                .await?
                .is_none()
        {
            warn!(company_id = %request.company_id, "Checkout refused without an open cash session");
            return Err(CoreError::from(SessionError::not_open(request.company_id.clone())).into());
        }

        let code = SaleRepository::next_code_in(&mut tx, &request.company_id, now.date_naive()).await?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            company_id: request.company_id.clone(),
            code,
            sub_total: totals.sub_total,
            tax_amount: totals.tax_amount,
            delivery_fee: totals.delivery_fee,
            discount_total: totals.discount_total,
            discount_reason: totals.discount_reason,
            grand_total: totals.grand_total,
            tendered_amount: settlement.tendered_total,
            change_amount: settlement.change_total,
            primary_method: settlement.primary_method.clone(),
            customer_name,
            delivery_address,
            created_by: actor.id.clone(),
            created_at: now,
        };

        SaleRepository::insert(&mut tx, &sale).await?;
        let postings = self
            .recorder
            .record(&mut tx, &sale, &settlement.allocations, actor)
            .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            code = %sale.code,
            grand_total = %sale.grand_total,
            primary_method = %sale.primary_method,
            "Checkout complete"
        );

        Ok(CheckoutReceipt {
            sale,
            allocations: settlement.allocations,
            tendered_total: settlement.tendered_total,
            change_total: settlement.change_total,
            primary_method: settlement.primary_method,
            session_id: postings.session_id,
            movements_posted: postings.movements.len(),
        })
    }

    /// Tender lines to settle: the submitted ones, or a single fallback
    /// line when the register sent no methods at all.
    fn tender_lines(&self, request: &CheckoutRequest, grand_total: Money) -> (Vec<String>, Vec<String>) {
        if !request.payment_methods.is_empty() {
            return (request.payment_methods.clone(), request.payment_amounts.clone());
        }

        let method = request
            .fallback_method
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.catalog.fallback_method.to_string());
        let amount = request
            .tendered_amount
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| grand_total.to_string());

        (vec![method], vec![amount])
    }

    /// A sale's payments, newest first, with method labels.
    pub async fn payment_summary(
        &self,
        company_id: &str,
        sale_id: &str,
    ) -> ServiceResult<Vec<PaymentSummaryLine>> {
        if self.db.sales().get_by_id(company_id, sale_id).await?.is_none() {
            return Err(CoreError::not_found("Sale", sale_id).into());
        }

        let lines = self
            .db
            .payments()
            .list_for_sale(sale_id)
            .await?
            .into_iter()
            .map(|p| PaymentSummaryLine {
                label: self.catalog.label(&p.method).to_string(),
                method: p.method,
                tendered: p.tendered,
                applied: p.applied,
                change: p.change,
                recorded_at: p.recorded_at,
                recorded_by: p.recorded_by,
            })
            .collect();

        Ok(lines)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
