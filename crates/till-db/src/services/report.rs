//! Session report loading.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::{MovementRepository, PaymentRepository, SaleRepository, SessionRepository};
use till_core::{CashSession, CoreError, PaymentCatalog, SessionRecord, SessionReport, SessionReportBuilder};

/// Loads a session with everything linked to it and builds its report.
#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
    catalog: PaymentCatalog,
}

impl ReportService {
    pub fn new(db: Database, catalog: PaymentCatalog) -> Self {
        ReportService { db, catalog }
    }

    /// Report for one session of the company, open or closed.
    ///
    /// Sessions of other companies read as not found.
    pub async fn session_report(&self, company_id: &str, session_id: &str) -> ServiceResult<SessionReport> {
        let mut tx = self.db.begin_read().await?;

        let record = SessionRepository::get_in(&mut tx, session_id)
            .await?
            .filter(|s| s.company_id == company_id)
            .ok_or_else(|| CoreError::not_found("CashSession", session_id))?;

        let report = self.build_in(&mut tx, record).await?;
        tx.commit().await?;

        Ok(report)
    }

    /// Builds the report for an already loaded session row.
    ///
    /// Movements, sales and payments are read on `conn`, so inside one
    /// transaction they come from the same snapshot and a checkout
    /// committing mid-build cannot split the totals.
    pub(crate) async fn build_in(
        &self,
        conn: &mut SqliteConnection,
        record: SessionRecord,
    ) -> ServiceResult<SessionReport> {
        let movements = MovementRepository::list_for_session_in(&mut *conn, &record.id).await?;
        let sales = SaleRepository::list_for_session_in(&mut *conn, &record.id).await?;
        let payments = PaymentRepository::list_for_session_in(&mut *conn, &record.id).await?;

        debug!(
            session_id = %record.id,
            movements = movements.len(),
            sales = sales.len(),
            payments = payments.len(),
            "Building session report"
        );

        let session = CashSession::from_parts(record, movements);
        Ok(SessionReportBuilder::new(&self.catalog).build(&session, &sales, &payments))
    }
}
