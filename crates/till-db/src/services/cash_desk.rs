//! # Cash Desk
//!
//! Session lifecycle use cases: open, manual movements, close, plus the
//! cashier's dashboard and session history.
//!
//! ## One Open Session per Company
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open_session                                                           │
//! │    BEGIN                                                                │
//! │      find OPEN session ── found ──► AlreadyOpen                        │
//! │      INSERT ── UNIQUE(company_id) WHERE status='open' violated         │
//! │                          └──► AlreadyOpen (a racing writer won)        │
//! │    COMMIT                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::pool::Database;
use crate::repository::{MovementRepository, SessionRepository, TableOrderRepository};
use crate::services::report::ReportService;
use till_core::validation::validate_required_text;
use till_core::{
    Actor, CashMovement, CashSession, ClosedSessionFacts, Company, CoreError, ManualMovementInput,
    Money, PaymentCatalog, PaymentError, SessionError, SessionRecord, SessionReport, TableOrder,
    DEFAULT_HISTORY_LIMIT,
};

/// Dashboard facts for a company's open session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub report: SessionReport,
    /// Every movement of the session, newest first.
    pub recent_movements: Vec<CashMovement>,
    pub open_table_orders: i64,
    /// What the drawer should hold right now (the expected balance).
    pub suggested_closing_amount: Money,
}

/// A page of past sessions.
#[derive(Debug, Clone, Serialize)]
pub struct SessionHistory {
    pub sessions: Vec<SessionRecord>,
    /// All sessions the company ever opened.
    pub total_count: i64,
}

/// Cash session use cases.
#[derive(Debug, Clone)]
pub struct CashDeskService {
    db: Database,
    catalog: PaymentCatalog,
    reports: ReportService,
}

impl CashDeskService {
    pub fn new(db: Database, catalog: PaymentCatalog) -> Self {
        let reports = ReportService::new(db.clone(), catalog.clone());
        CashDeskService { db, catalog, reports }
    }

    /// Opens the company's drawer.
    pub async fn open_session(
        &self,
        company: &Company,
        actor: &Actor,
        opening_amount: Money,
        note: Option<&str>,
    ) -> ServiceResult<SessionRecord> {
        let session = CashSession::open(company, actor, opening_amount, note, Utc::now())?;

        let mut tx = self.db.begin().await?;

        if SessionRepository::find_open_in(&mut tx, &company.id).await?.is_some() {
            warn!(company_id = %company.id, "Cash session already open");
            return Err(already_open(&company.id));
        }

        match SessionRepository::insert(&mut tx, session.record()).await {
            Ok(()) => {}
            Err(err) if err.is_unique_violation_on("cash_sessions") => {
                warn!(company_id = %company.id, "Lost race opening cash session");
                return Err(already_open(&company.id));
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;

        info!(
            session_id = %session.id(),
            company_id = %company.id,
            opening_amount = %opening_amount,
            opened_by = %actor.name,
            "Cash session opened"
        );

        Ok(session.record().clone())
    }

    /// The company's OPEN session, if any.
    pub async fn find_open_session(&self, company_id: &str) -> ServiceResult<Option<SessionRecord>> {
        Ok(self.db.sessions().find_open(company_id).await?)
    }

    /// Records a float top-up, withdrawal or other operator movement.
    pub async fn post_manual_movement(
        &self,
        session_id: &str,
        input: ManualMovementInput,
        actor: &Actor,
    ) -> ServiceResult<CashMovement> {
        if let Some(method) = input.payment_method.as_ref().filter(|m| !m.is_empty()) {
            if !self.catalog.is_valid_input(method) {
                return Err(PaymentError::InvalidMethod {
                    method: method.to_string(),
                }
                .into());
            }
        }

        let mut tx = self.db.begin().await?;
        let mut session = load_session(&mut tx, session_id).await?;

        let movement = session.record_manual_movement(input, actor, Utc::now())?;
        MovementRepository::insert(&mut tx, &movement).await?;

        tx.commit().await?;

        info!(
            session_id = %session_id,
            movement_type = %movement.movement_type,
            amount = %movement.amount,
            "Manual cash movement recorded"
        );

        Ok(movement)
    }

    /// Closes the drawer with the counted amount.
    ///
    /// Fails with `OpenOrdersExist` while the company has open table
    /// orders. A counted amount that differs from the expected balance is
    /// recorded, not rejected.
    pub async fn close_session(
        &self,
        session_id: &str,
        actor: &Actor,
        closing_amount: Money,
        note: Option<&str>,
    ) -> ServiceResult<ClosedSessionFacts> {
        let mut tx = self.db.begin().await?;
        let mut session = load_session(&mut tx, session_id).await?;

        let open_orders = TableOrderRepository::count_open_in(&mut tx, &session.record().company_id).await?;
        if open_orders > 0 {
            warn!(session_id = %session_id, open_orders, "Close blocked by open table orders");
            return Err(CoreError::from(SessionError::OpenOrdersExist { count: open_orders }).into());
        }

        let facts = session.close(actor, closing_amount, note, Utc::now())?;

        match SessionRepository::close(&mut tx, session.record()).await {
            Ok(()) => {}
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::from(SessionError::not_open(session_id)).into())
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;

        info!(
            session_id = %session_id,
            expected = %facts.expected_balance,
            closing = %facts.closing_amount,
            difference = %facts.difference,
            closed_by = %actor.name,
            "Cash session closed"
        );

        Ok(facts)
    }

    /// Dashboard for the company's open session; `None` when the drawer is
    /// closed.
    pub async fn overview(&self, company_id: &str) -> ServiceResult<Option<SessionOverview>> {
        let mut tx = self.db.begin_read().await?;

        let Some(record) = SessionRepository::find_open_in(&mut tx, company_id).await? else {
            return Ok(None);
        };

        let mut recent_movements = MovementRepository::list_for_session_in(&mut tx, &record.id).await?;
        recent_movements.reverse();

        let report = self.reports.build_in(&mut tx, record).await?;
        let open_table_orders = TableOrderRepository::count_open_in(&mut tx, company_id).await?;
        tx.commit().await?;

        Ok(Some(SessionOverview {
            suggested_closing_amount: report.expected_balance,
            report,
            recent_movements,
            open_table_orders,
        }))
    }

    /// Past sessions, newest first.
    ///
    /// With a date: every session opened that day (UTC). Without: the
    /// latest `limit` (default 5).
    pub async fn session_history(
        &self,
        company_id: &str,
        date: Option<NaiveDate>,
        limit: Option<i64>,
    ) -> ServiceResult<SessionHistory> {
        let sessions = self.db.sessions();

        let page = match date {
            Some(day) => {
                let start = day.and_time(NaiveTime::MIN).and_utc();
                sessions
                    .list_opened_between(company_id, start, start + Duration::days(1))
                    .await?
            }
            None => {
                let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_HISTORY_LIMIT);
                sessions.list_recent(company_id, limit).await?
            }
        };

        Ok(SessionHistory {
            sessions: page,
            total_count: sessions.count(company_id).await?,
        })
    }

    /// Opens a dine-in table order.
    pub async fn open_table_order(&self, company_id: &str, label: &str) -> ServiceResult<TableOrder> {
        let label = validate_required_text("label", label)?;
        let order = self.db.table_orders().open(company_id, &label).await?;

        info!(order_id = %order.id, label = %order.label, "Table order opened");
        Ok(order)
    }

    /// Closes a dine-in table order.
    pub async fn close_table_order(&self, company_id: &str, order_id: &str) -> ServiceResult<()> {
        self.db.table_orders().close(company_id, order_id).await?;

        info!(order_id = %order_id, "Table order closed");
        Ok(())
    }
}

/// Loads a session that must still be OPEN.
async fn load_session(conn: &mut SqliteConnection, session_id: &str) -> ServiceResult<CashSession> {
    let record = SessionRepository::get_in(&mut *conn, session_id)
        .await?
        .filter(SessionRecord::is_open)
        .ok_or_else(|| CoreError::from(SessionError::not_open(session_id)))?;

    let movements = MovementRepository::list_for_session_in(&mut *conn, session_id).await?;
    Ok(CashSession::from_parts(record, movements))
}

fn already_open(company_id: &str) -> ServiceError {
    CoreError::from(SessionError::AlreadyOpen {
        company_id: company_id.to_string(),
    })
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use till_core::{ErrorKind, MovementType, PaymentMethodCode, SessionStatus};

    async fn desk() -> CashDeskService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        CashDeskService::new(db, PaymentCatalog::default())
    }

    fn company() -> Company {
        Company::new("company-1", "Corner Bakery")
    }

    fn cashier() -> Actor {
        Actor::new("user-1", "Ana")
    }

    fn withdrawal(cents: i64) -> ManualMovementInput {
        ManualMovementInput {
            movement_type: MovementType::Exit,
            amount: Money::from_cents(cents),
            payment_method: None,
            description: "Bank deposit".to_string(),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_open_session_persists_open_record() {
        let desk = desk().await;

        let record = desk
            .open_session(&company(), &cashier(), Money::from_cents(200_00), Some("morning"))
            .await
            .unwrap();

        let found = desk.find_open_session("company-1").await.unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.status, SessionStatus::Open);
        assert_eq!(found.opening_amount, Money::from_cents(200_00));
        assert_eq!(found.opening_note.as_deref(), Some("morning"));
    }

    #[tokio::test]
    async fn test_second_open_session_is_rejected() {
        let desk = desk().await;
        desk.open_session(&company(), &cashier(), Money::zero(), None)
            .await
            .unwrap();

        let err = desk
            .open_session(&company(), &cashier(), Money::zero(), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyOpen);
    }

    #[tokio::test]
    async fn test_other_company_can_open_alongside() {
        let desk = desk().await;
        desk.open_session(&company(), &cashier(), Money::zero(), None)
            .await
            .unwrap();

        let other = Company::new("company-2", "Night Kiosk");
        assert!(desk
            .open_session(&other, &cashier(), Money::zero(), None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_manual_movement_moves_expected_balance() {
        let desk = desk().await;
        let session = desk
            .open_session(&company(), &cashier(), Money::from_cents(100_00), None)
            .await
            .unwrap();

        desk.post_manual_movement(&session.id, withdrawal(30_00), &cashier())
            .await
            .unwrap();

        let overview = desk.overview("company-1").await.unwrap().unwrap();
        assert_eq!(overview.suggested_closing_amount, Money::from_cents(70_00));
        assert_eq!(overview.recent_movements.len(), 1);
        assert_eq!(overview.report.manual_movements.len(), 1);
    }

    #[tokio::test]
    async fn test_manual_movement_rejects_unknown_method() {
        let desk = desk().await;
        let session = desk
            .open_session(&company(), &cashier(), Money::zero(), None)
            .await
            .unwrap();

        let mut input = withdrawal(5_00);
        input.payment_method = Some(PaymentMethodCode::new("voucher"));

        let err = desk
            .post_manual_movement(&session.id, input, &cashier())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMethod);
    }

    #[tokio::test]
    async fn test_manual_movement_on_unknown_session_is_not_open() {
        let desk = desk().await;

        let err = desk
            .post_manual_movement("missing", withdrawal(5_00), &cashier())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotOpen);
    }

    #[tokio::test]
    async fn test_close_session_records_difference() {
        let desk = desk().await;
        let session = desk
            .open_session(&company(), &cashier(), Money::from_cents(50_00), None)
            .await
            .unwrap();

        let facts = desk
            .close_session(&session.id, &cashier(), Money::from_cents(48_00), Some("short"))
            .await
            .unwrap();

        assert_eq!(facts.expected_balance, Money::from_cents(50_00));
        assert_eq!(facts.difference, Money::from_cents(-2_00));
        assert!(desk.find_open_session("company-1").await.unwrap().is_none());
        assert!(desk.overview("company-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_twice_is_not_open() {
        let desk = desk().await;
        let session = desk
            .open_session(&company(), &cashier(), Money::zero(), None)
            .await
            .unwrap();
        desk.close_session(&session.id, &cashier(), Money::zero(), None)
            .await
            .unwrap();

        let err = desk
            .close_session(&session.id, &cashier(), Money::zero(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotOpen);
    }

    #[tokio::test]
    async fn test_close_blocked_by_open_table_orders() {
        let desk = desk().await;
        let session = desk
            .open_session(&company(), &cashier(), Money::zero(), None)
            .await
            .unwrap();
        let order = desk.open_table_order("company-1", "Table 4").await.unwrap();

        let err = desk
            .close_session(&session.id, &cashier(), Money::zero(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OpenOrdersExist);

        desk.close_table_order("company-1", &order.id).await.unwrap();
        assert!(desk
            .close_session(&session.id, &cashier(), Money::zero(), None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_table_order_label_is_required() {
        let desk = desk().await;

        let err = desk.open_table_order("company-1", "   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_session_history_defaults_to_latest_five() {
        let desk = desk().await;
        for _ in 0..6 {
            let session = desk
                .open_session(&company(), &cashier(), Money::zero(), None)
                .await
                .unwrap();
            desk.close_session(&session.id, &cashier(), Money::zero(), None)
                .await
                .unwrap();
        }

        let history = desk.session_history("company-1", None, None).await.unwrap();
        assert_eq!(history.sessions.len(), 5);
        assert_eq!(history.total_count, 6);

        let today = Utc::now().date_naive();
        let by_day = desk
            .session_history("company-1", Some(today), None)
            .await
            .unwrap();
        assert_eq!(by_day.sessions.len(), 6);
    }
}
