//! # Cash Session
//!
//! One drawer lifecycle, from opening float to counted close.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open(opening_amount >= 0)                                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌─────────┐  sale tender  ──► ENTRY (tendered)                       │
//! │   │  OPEN   │  sale change  ──► EXIT  (change, cash)                   │
//! │   │         │  manual       ──► ENTRY | EXIT                           │
//! │   └────┬────┘                                                           │
//! │        │ close(closing_amount >= 0)                                    │
//! │        ▼                                                                │
//! │   ┌─────────┐                                                           │
//! │   │ CLOSED  │  immutable; difference = closing - expected              │
//! │   └─────────┘                                                           │
//! │                                                                         │
//! │   expected = opening + Σ ENTRY - Σ EXIT  (always from the movement log) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Movements are append-only. There is no stored running balance that could
//! drift from the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreResult, SessionError};
use crate::money::Money;
use crate::types::{Actor, Company, MovementType, PaymentMethodCode, SessionStatus};
use crate::validation::{
    validate_non_negative_amount, validate_optional_text, validate_positive_amount,
    validate_required_text,
};

// =============================================================================
// Persisted Records
// =============================================================================

/// A cash register session as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SessionRecord {
    pub id: String,
    pub company_id: String,
    /// Company name at the time of opening.
    pub company_name: String,
    pub status: SessionStatus,
    pub opened_by: String,
    pub opened_by_name: String,
    pub opened_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "opening_amount_cents"))]
    pub opening_amount: Money,
    pub opening_note: Option<String>,
    pub closed_by: Option<String>,
    pub closed_by_name: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "closing_amount_cents"))]
    pub closing_amount: Option<Money>,
    pub closing_note: Option<String>,
}

impl SessionRecord {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

/// One ledger line of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashMovement {
    pub id: String,
    pub company_id: String,
    pub session_id: String,
    pub movement_type: MovementType,
    /// Always positive; direction comes from `movement_type`.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "amount_cents"))]
    pub amount: Money,
    pub payment_method: Option<PaymentMethodCode>,
    pub description: String,
    pub note: Option<String>,
    /// Set for movements posted by a sale.
    pub sale_id: Option<String>,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}

impl CashMovement {
    /// Manual movements are the ones no sale posted.
    pub fn is_manual(&self) -> bool {
        self.sale_id.is_none()
    }

    /// Amount signed by direction: entries positive, exits negative.
    pub fn signed_amount(&self) -> Money {
        match self.movement_type {
            MovementType::Entry => self.amount,
            MovementType::Exit => -self.amount,
        }
    }
}

/// Operator input for a manual movement (float top-up, withdrawal, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualMovementInput {
    pub movement_type: MovementType,
    pub amount: Money,
    pub payment_method: Option<PaymentMethodCode>,
    pub description: String,
    pub note: Option<String>,
}

// =============================================================================
// Totals
// =============================================================================

/// Balance facts derived from a session's movement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTotals {
    pub opening_amount: Money,
    pub total_entries: Money,
    pub total_exits: Money,
    pub expected_balance: Money,
}

impl SessionTotals {
    pub fn compute(opening_amount: Money, movements: &[CashMovement]) -> Self {
        let total_of = |kind: MovementType| -> Money {
            movements
                .iter()
                .filter(|m| m.movement_type == kind)
                .map(|m| m.amount)
                .sum()
        };

        let total_entries = total_of(MovementType::Entry);
        let total_exits = total_of(MovementType::Exit);

        SessionTotals {
            opening_amount,
            total_entries,
            total_exits,
            expected_balance: opening_amount + total_entries - total_exits,
        }
    }
}

/// Reconciliation facts produced by closing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedSessionFacts {
    pub session_id: String,
    pub opening_amount: Money,
    pub total_entries: Money,
    pub total_exits: Money,
    pub expected_balance: Money,
    pub closing_amount: Money,
    /// `closing - expected`. Negative is a shortage, positive an overage.
    pub difference: Money,
    pub closed_at: DateTime<Utc>,
}

// =============================================================================
// Aggregate
// =============================================================================

/// A session record plus its movement log.
#[derive(Debug, Clone)]
pub struct CashSession {
    record: SessionRecord,
    movements: Vec<CashMovement>,
}

impl CashSession {
    /// Starts a new OPEN session.
    ///
    /// The one-open-session-per-company rule needs storage and is enforced
    /// by the caller (see `till-db`).
    pub fn open(
        company: &Company,
        actor: &Actor,
        opening_amount: Money,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validate_non_negative_amount("opening_amount", opening_amount)?;
        let opening_note = validate_optional_text("opening_note", note)?;

        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            company_id: company.id.clone(),
            company_name: company.name.clone(),
            status: SessionStatus::Open,
            opened_by: actor.id.clone(),
            opened_by_name: actor.name.clone(),
            opened_at: at,
            opening_amount,
            opening_note,
            closed_by: None,
            closed_by_name: None,
            closed_at: None,
            closing_amount: None,
            closing_note: None,
        };

        Ok(CashSession {
            record,
            movements: Vec::new(),
        })
    }

    /// Rebuilds the aggregate from storage.
    pub fn from_parts(record: SessionRecord, movements: Vec<CashMovement>) -> Self {
        CashSession { record, movements }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn movements(&self) -> &[CashMovement] {
        &self.movements
    }

    pub fn is_open(&self) -> bool {
        self.record.is_open()
    }

    pub fn totals(&self) -> SessionTotals {
        SessionTotals::compute(self.record.opening_amount, &self.movements)
    }

    pub fn total_entries(&self) -> Money {
        self.totals().total_entries
    }

    pub fn total_exits(&self) -> Money {
        self.totals().total_exits
    }

    /// `opening + entries - exits`, recomputed on every call.
    pub fn expected_balance(&self) -> Money {
        self.totals().expected_balance
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SessionError::not_open(self.record.id.clone()))
        }
    }

    /// Appends an operator movement and returns it.
    pub fn record_manual_movement(
        &mut self,
        input: ManualMovementInput,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> CoreResult<CashMovement> {
        self.ensure_open()?;
        validate_positive_amount("amount", input.amount)?;
        let description = validate_required_text("description", &input.description)?;
        let note = validate_optional_text("note", input.note.as_deref())?;

        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            company_id: self.record.company_id.clone(),
            session_id: self.record.id.clone(),
            movement_type: input.movement_type,
            amount: input.amount,
            payment_method: input.payment_method.filter(|m| !m.is_empty()),
            description,
            note,
            sale_id: None,
            recorded_by: actor.id.clone(),
            recorded_at: at,
        };

        self.movements.push(movement.clone());
        Ok(movement)
    }

    /// Closes the session with the physically counted amount.
    ///
    /// A discrepancy is recorded in the facts, never rejected.
    pub fn close(
        &mut self,
        actor: &Actor,
        closing_amount: Money,
        note: Option<&str>,
        at: DateTime<Utc>,
    ) -> CoreResult<ClosedSessionFacts> {
        self.ensure_open()?;
        validate_non_negative_amount("closing_amount", closing_amount)?;
        let closing_note = validate_optional_text("closing_note", note)?;

        let totals = self.totals();

        self.record.status = SessionStatus::Closed;
        self.record.closed_by = Some(actor.id.clone());
        self.record.closed_by_name = Some(actor.name.clone());
        self.record.closed_at = Some(at);
        self.record.closing_amount = Some(closing_amount);
        self.record.closing_note = closing_note;

        Ok(ClosedSessionFacts {
            session_id: self.record.id.clone(),
            opening_amount: totals.opening_amount,
            total_entries: totals.total_entries,
            total_exits: totals.total_exits,
            expected_balance: totals.expected_balance,
            closing_amount,
            difference: closing_amount - totals.expected_balance,
            closed_at: at,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    fn company() -> Company {
        Company::new("store-1", "Corner Store")
    }

    fn cashier() -> Actor {
        Actor::new("u-1", "Ana")
    }

    fn money(raw: &str) -> Money {
        Money::parse(raw).unwrap()
    }

    fn manual(kind: MovementType, amount: &str, description: &str) -> ManualMovementInput {
        ManualMovementInput {
            movement_type: kind,
            amount: money(amount),
            payment_method: Some("CASH".into()),
            description: description.to_string(),
            note: None,
        }
    }

    fn open(opening: &str) -> CashSession {
        CashSession::open(&company(), &cashier(), money(opening), None, Utc::now()).unwrap()
    }

    #[test]
    fn test_open_snapshots_names() {
        let session = open("200.00");
        let record = session.record();

        assert!(session.is_open());
        assert_eq!(record.company_name, "Corner Store");
        assert_eq!(record.opened_by_name, "Ana");
        assert_eq!(session.expected_balance(), money("200.00"));
    }

    #[test]
    fn test_open_rejects_negative_float() {
        let result = CashSession::open(&company(), &cashier(), money("-1"), None, Utc::now());
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[test]
    fn test_expected_balance_from_log() {
        let mut session = open("100.00");
        session
            .record_manual_movement(manual(MovementType::Entry, "500.00", "Sales"), &cashier(), Utc::now())
            .unwrap();
        session
            .record_manual_movement(manual(MovementType::Exit, "40.00", "Courier"), &cashier(), Utc::now())
            .unwrap();

        assert_eq!(session.total_entries(), money("500.00"));
        assert_eq!(session.total_exits(), money("40.00"));
        assert_eq!(session.expected_balance(), money("560.00"));
        assert_eq!(session.movements().len(), 2);
    }

    #[test]
    fn test_close_reports_shortage() {
        let mut session = open("100.00");
        session
            .record_manual_movement(manual(MovementType::Entry, "500.00", "Sales"), &cashier(), Utc::now())
            .unwrap();
        session
            .record_manual_movement(manual(MovementType::Exit, "40.00", "Courier"), &cashier(), Utc::now())
            .unwrap();

        let facts = session
            .close(&cashier(), money("555.00"), Some("short"), Utc::now())
            .unwrap();

        assert_eq!(facts.expected_balance, money("560.00"));
        assert_eq!(facts.difference, money("-5.00"));
        assert_eq!(session.record().status, SessionStatus::Closed);
        assert_eq!(session.record().closing_amount, Some(money("555.00")));
        assert_eq!(session.record().closing_note.as_deref(), Some("short"));
    }

    #[test]
    fn test_closed_session_rejects_everything() {
        let mut session = open("0");
        session.close(&cashier(), Money::zero(), None, Utc::now()).unwrap();

        let err = session.close(&cashier(), Money::zero(), None, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Session(SessionError::NotOpen { .. })));

        let err = session
            .record_manual_movement(manual(MovementType::Entry, "1.00", "late"), &cashier(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Session(SessionError::NotOpen { .. })));
    }

    #[test]
    fn test_manual_movement_validation() {
        let mut session = open("0");

        let err = session
            .record_manual_movement(manual(MovementType::Entry, "0", "nothing"), &cashier(), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));

        let err = session
            .record_manual_movement(manual(MovementType::Exit, "5", "  "), &cashier(), Utc::now())
            .unwrap_err();
        assert_eq!(err, CoreError::Validation(ValidationError::required("description")));
        assert!(session.movements().is_empty());
    }

    #[test]
    fn test_manual_movement_is_manual() {
        let mut session = open("0");
        let movement = session
            .record_manual_movement(manual(MovementType::Exit, "12.00", "Ice"), &cashier(), Utc::now())
            .unwrap();

        assert!(movement.is_manual());
        assert_eq!(movement.signed_amount(), money("-12.00"));
        assert_eq!(movement.session_id, session.id());
    }
}
