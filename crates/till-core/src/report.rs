//! # Session Report
//!
//! Aggregates the auditable facts of one cash session. Rendering (text,
//! JSON, PDF) is the caller's business.
//!
//! ## Report Sections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Header      company, period, operators, status                        │
//! │  Summary     opening, Σ entries, Σ exits, expected,                    │
//! │              closing + difference (closed sessions only)               │
//! │  By method   Σ applied / Σ tendered / Σ change, ordered by code        │
//! │  Discounts   per sale code, ordered by code, plus the total            │
//! │  Manual      unlinked movements, chronological                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only sales linked to at least one of the session's movements count.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::PaymentCatalog;
use crate::money::Money;
use crate::session::CashSession;
use crate::types::{MovementType, PaymentMethodCode, Sale, SalePayment, SessionStatus};

/// Reason shown for a discount recorded without one.
pub const DISCOUNT_REASON_PLACEHOLDER: &str = "Not informed";

// =============================================================================
// Report Facts
// =============================================================================

/// Per-method rollup of sale payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTotal {
    pub method: PaymentMethodCode,
    pub label: String,
    pub total_applied: Money,
    pub total_tendered: Money,
    pub total_change: Money,
}

/// A discounted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountLine {
    pub sale_code: String,
    pub discount: Money,
    pub reason: String,
    pub grand_total: Money,
}

/// An operator movement as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualMovementLine {
    pub recorded_at: DateTime<Utc>,
    pub movement_type: MovementType,
    pub amount: Money,
    pub payment_method: Option<PaymentMethodCode>,
    pub method_label: String,
    pub description: String,
    pub note: Option<String>,
}

/// Everything a session report shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub company_id: String,
    pub company_name: String,
    pub session_id: String,
    pub status: SessionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub opened_by_name: String,
    pub closed_by_name: Option<String>,
    pub opening_note: Option<String>,
    pub closing_note: Option<String>,

    pub opening_amount: Money,
    pub total_entries: Money,
    pub total_exits: Money,
    pub expected_balance: Money,
    /// Counted amount; `None` while the session is open.
    pub closing_amount: Option<Money>,
    /// `closing - expected`; `None` while the session is open.
    pub difference: Option<Money>,

    pub sale_count: usize,
    pub payment_totals: Vec<MethodTotal>,
    pub discounts: Vec<DiscountLine>,
    pub total_discount: Money,
    pub manual_movements: Vec<ManualMovementLine>,
}

// =============================================================================
// Builder
// =============================================================================

/// Builds [`SessionReport`]s. Holds the catalog for method labels.
#[derive(Debug, Clone, Copy)]
pub struct SessionReportBuilder<'a> {
    catalog: &'a PaymentCatalog,
}

impl<'a> SessionReportBuilder<'a> {
    pub fn new(catalog: &'a PaymentCatalog) -> Self {
        SessionReportBuilder { catalog }
    }

    /// Aggregates the report.
    ///
    /// `sales` and `payments` may be a superset; anything not linked to the
    /// session's movements is ignored.
    pub fn build(
        &self,
        session: &CashSession,
        sales: &[Sale],
        payments: &[SalePayment],
    ) -> SessionReport {
        let record = session.record();
        let totals = session.totals();

        let linked: BTreeSet<&str> = session
            .movements()
            .iter()
            .filter_map(|m| m.sale_id.as_deref())
            .collect();

        let difference = record
            .closing_amount
            .filter(|_| !record.is_open())
            .map(|closing| closing - totals.expected_balance);

        let discounts = self.discount_lines(sales, &linked);
        let total_discount = discounts.iter().map(|d| d.discount).sum();

        SessionReport {
            company_id: record.company_id.clone(),
            company_name: record.company_name.clone(),
            session_id: record.id.clone(),
            status: record.status,
            opened_at: record.opened_at,
            closed_at: record.closed_at,
            opened_by_name: record.opened_by_name.clone(),
            closed_by_name: record.closed_by_name.clone(),
            opening_note: record.opening_note.clone(),
            closing_note: record.closing_note.clone(),
            opening_amount: totals.opening_amount,
            total_entries: totals.total_entries,
            total_exits: totals.total_exits,
            expected_balance: totals.expected_balance,
            closing_amount: record.closing_amount.filter(|_| !record.is_open()),
            difference,
            sale_count: linked.len(),
            payment_totals: self.method_totals(payments, &linked),
            discounts,
            total_discount,
            manual_movements: self.manual_movements(session),
        }
    }

    fn method_totals(&self, payments: &[SalePayment], linked: &BTreeSet<&str>) -> Vec<MethodTotal> {
        let mut by_method: BTreeMap<&PaymentMethodCode, (Money, Money, Money)> = BTreeMap::new();

        for payment in payments
            .iter()
            .filter(|p| linked.contains(p.sale_id.as_str()))
        {
            let sums = by_method.entry(&payment.method).or_default();
            sums.0 += payment.applied;
            sums.1 += payment.tendered;
            sums.2 += payment.change;
        }

        by_method
            .into_iter()
            .map(|(method, (applied, tendered, change))| MethodTotal {
                method: method.clone(),
                label: self.catalog.label(method).to_string(),
                total_applied: applied,
                total_tendered: tendered,
                total_change: change,
            })
            .collect()
    }

    fn discount_lines(&self, sales: &[Sale], linked: &BTreeSet<&str>) -> Vec<DiscountLine> {
        let mut lines: Vec<DiscountLine> = sales
            .iter()
            .filter(|s| linked.contains(s.id.as_str()) && s.discount_total.is_positive())
            .map(|s| DiscountLine {
                sale_code: s.code.clone(),
                discount: s.discount_total,
                reason: s
                    .discount_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(DISCOUNT_REASON_PLACEHOLDER)
                    .to_string(),
                grand_total: s.grand_total,
            })
            .collect();

        lines.sort_by(|a, b| a.sale_code.cmp(&b.sale_code));
        lines
    }

    fn manual_movements(&self, session: &CashSession) -> Vec<ManualMovementLine> {
        let mut lines: Vec<ManualMovementLine> = session
            .movements()
            .iter()
            .filter(|m| m.is_manual())
            .map(|m| ManualMovementLine {
                recorded_at: m.recorded_at,
                movement_type: m.movement_type,
                amount: m.amount,
                payment_method: m.payment_method.clone(),
                method_label: self
                    .catalog
                    .label_or_unknown(m.payment_method.as_ref())
                    .to_string(),
                description: m.description.clone(),
                note: m.note.clone(),
            })
            .collect();

        // Stable: equal timestamps keep log order.
        lines.sort_by_key(|l| l.recorded_at);
        lines
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
