//! # Sale Posting Plan
//!
//! Decides which rows a finalised sale writes. Storage executes the plan
//! inside one transaction.
//!
//! ```text
//! Allocation { CASH, tendered 200.00, applied 150.00, change 50.00 }
//!      │
//!      ├──► SalePayment  (CASH, 200.00 / 150.00 / 50.00)        always
//!      │
//!      └──► open session?
//!             ├── yes ─► ENTRY 200.00 CASH  "Payment <code>"
//!             │          EXIT   50.00 CASH  "Change <code>"
//!             └── no ──► (no movements)
//! ```
//!
//! The ENTRY carries the full tendered amount, not the applied part. The
//! change leaves again as a separate EXIT so the drawer count stays exact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::PaymentCatalog;
use crate::session::{CashMovement, SessionRecord};
use crate::types::{Actor, Allocation, MovementType, Sale, SalePayment};

/// Rows to insert for one sale.
#[derive(Debug, Clone, Serialize)]
pub struct SalePostings {
    pub payments: Vec<SalePayment>,
    pub movements: Vec<CashMovement>,
    /// The session the movements were posted to, if any.
    pub session_id: Option<String>,
}

/// Builds payments and movements for `sale`.
///
/// `open_session` must be the company's OPEN session, or `None` when the
/// company has no drawer open. In the latter case only payments are
/// produced.
pub fn plan_sale_postings(
    catalog: &PaymentCatalog,
    sale: &Sale,
    allocations: &[Allocation],
    open_session: Option<&SessionRecord>,
    actor: &Actor,
    at: DateTime<Utc>,
) -> SalePostings {
    let payments = allocations
        .iter()
        .map(|allocation| SalePayment {
            id: Uuid::new_v4().to_string(),
            company_id: sale.company_id.clone(),
            sale_id: sale.id.clone(),
            method: allocation.method.clone(),
            tendered: allocation.tendered,
            applied: allocation.applied,
            change: allocation.change,
            recorded_by: actor.id.clone(),
            recorded_at: at,
        })
        .collect();

    let session = match open_session.filter(|s| s.is_open()) {
        Some(session) => session,
        None => {
            return SalePostings {
                payments,
                movements: Vec::new(),
                session_id: None,
            }
        }
    };

    let movement = |kind: MovementType, allocation: &Allocation, description: String| {
        let (amount, method) = match kind {
            MovementType::Entry => (allocation.tendered, allocation.method.clone()),
            MovementType::Exit => (allocation.change, catalog.cash_method.clone()),
        };
        CashMovement {
            id: Uuid::new_v4().to_string(),
            company_id: sale.company_id.clone(),
            session_id: session.id.clone(),
            movement_type: kind,
            amount,
            payment_method: Some(method),
            description,
            note: None,
            sale_id: Some(sale.id.clone()),
            recorded_by: actor.id.clone(),
            recorded_at: at,
        }
    };

    let mut movements = Vec::new();
    for allocation in allocations {
        if allocation.tendered.is_positive() {
            movements.push(movement(
                MovementType::Entry,
                allocation,
                format!("Payment {}", sale.code),
            ));
        }
        if allocation.change.is_positive() {
            movements.push(movement(
                MovementType::Exit,
                allocation,
                format!("Change {}", sale.code),
            ));
        }
    }

    SalePostings {
        payments,
        movements,
        session_id: Some(session.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::session::CashSession;
    use crate::types::{Company, PaymentMethodCode};

    fn money(raw: &str) -> Money {
        Money::parse(raw).unwrap()
    }

    fn sale(grand_total: &str) -> Sale {
        Sale {
            id: "sale-1".to_string(),
            company_id: "store-1".to_string(),
            code: "20260101-00001".to_string(),
            sub_total: money(grand_total),
            tax_amount: Money::zero(),
            delivery_fee: Money::zero(),
            discount_total: Money::zero(),
            discount_reason: None,
            grand_total: money(grand_total),
            tendered_amount: Money::zero(),
            change_amount: Money::zero(),
            primary_method: PaymentMethodCode::new("CASH"),
            customer_name: None,
            delivery_address: None,
            created_by: "u-1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn allocation(method: &str, tendered: &str, applied: &str, change: &str) -> Allocation {
        Allocation {
            method: method.into(),
            tendered: money(tendered),
            applied: money(applied),
            change: money(change),
        }
    }

    fn open_session() -> CashSession {
        CashSession::open(
            &Company::new("store-1", "Corner Store"),
            &Actor::new("u-1", "Ana"),
            money("200.00"),
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_cash_sale_posts_entry_and_change_exit() {
        let catalog = PaymentCatalog::default();
        let session = open_session();
        let allocations = [allocation("CASH", "200.00", "150.00", "50.00")];

        let plan = plan_sale_postings(
            &catalog,
            &sale("150.00"),
            &allocations,
            Some(session.record()),
            &Actor::new("u-1", "Ana"),
            Utc::now(),
        );

        assert_eq!(plan.payments.len(), 1);
        assert_eq!(plan.session_id.as_deref(), Some(session.id()));
        assert_eq!(plan.movements.len(), 2);

        let entry = &plan.movements[0];
        assert_eq!(entry.movement_type, MovementType::Entry);
        assert_eq!(entry.amount, money("200.00"));
        assert_eq!(entry.description, "Payment 20260101-00001");
        assert_eq!(entry.sale_id.as_deref(), Some("sale-1"));

        let exit = &plan.movements[1];
        assert_eq!(exit.movement_type, MovementType::Exit);
        assert_eq!(exit.amount, money("50.00"));
        assert_eq!(exit.description, "Change 20260101-00001");

        let session = CashSession::from_parts(session.record().clone(), plan.movements);
        assert_eq!(session.expected_balance(), money("350.00"));
    }

    #[test]
    fn test_change_exit_is_always_cash() {
        let catalog = PaymentCatalog::default();
        let session = open_session();
        let allocations = [
            allocation("PIX", "30.00", "30.00", "0"),
            allocation("CASH", "60.00", "50.00", "10.00"),
        ];

        let plan = plan_sale_postings(
            &catalog,
            &sale("80.00"),
            &allocations,
            Some(session.record()),
            &Actor::new("u-1", "Ana"),
            Utc::now(),
        );

        let methods: Vec<(MovementType, &str)> = plan
            .movements
            .iter()
            .map(|m| (m.movement_type, m.payment_method.as_ref().map_or("", |c| c.as_str())))
            .collect();
        assert_eq!(
            methods,
            vec![
                (MovementType::Entry, "PIX"),
                (MovementType::Entry, "CASH"),
                (MovementType::Exit, "CASH"),
            ]
        );
    }

    #[test]
    fn test_no_open_session_posts_payments_only() {
        let catalog = PaymentCatalog::default();
        let allocations = [allocation("PIX", "80.00", "80.00", "0")];

        let plan = plan_sale_postings(
            &catalog,
            &sale("80.00"),
            &allocations,
            None,
            &Actor::new("u-1", "Ana"),
            Utc::now(),
        );

        assert_eq!(plan.payments.len(), 1);
        assert!(plan.movements.is_empty());
        assert!(plan.session_id.is_none());
    }

    #[test]
    fn test_closed_session_is_treated_as_absent() {
        let catalog = PaymentCatalog::default();
        let mut session = open_session();
        session
            .close(&Actor::new("u-1", "Ana"), Money::zero(), None, Utc::now())
            .unwrap();

        let plan = plan_sale_postings(
            &catalog,
            &sale("10.00"),
            &[allocation("CASH", "10.00", "10.00", "0")],
            Some(session.record()),
            &Actor::new("u-1", "Ana"),
            Utc::now(),
        );
        assert!(plan.movements.is_empty());
    }
}
