//! # Sale Payment Recorder
//!
//! Persists a finalised sale's payments and, when the company has a drawer
//! open, the matching cash movements.
//!
//! ```text
//! BEGIN
//!   find OPEN session (same transaction)
//!   plan_sale_postings(..)            ← till-core, pure
//!   INSERT sale_payments  × n
//!   INSERT cash_movements × m         (m = 0 without an open session)
//! COMMIT                              any failure: nothing is written
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::{MovementRepository, PaymentRepository, SessionRepository};
use till_core::{plan_sale_postings, Actor, Allocation, PaymentCatalog, Sale, SalePostings};

/// Records sale payments against the ledger.
#[derive(Debug, Clone)]
pub struct SalePaymentRecorder {
    db: Database,
    catalog: PaymentCatalog,
}

impl SalePaymentRecorder {
    pub fn new(db: Database, catalog: PaymentCatalog) -> Self {
        SalePaymentRecorder { db, catalog }
    }

    /// Writes payments and movements on the caller's connection.
    ///
    /// Run it inside a transaction: the open-session lookup and every
    /// insert must see and commit the same state.
    pub async fn record(
        &self,
        conn: &mut SqliteConnection,
        sale: &Sale,
        allocations: &[Allocation],
        actor: &Actor,
    ) -> DbResult<SalePostings> {
        let open_session = SessionRepository::find_open_in(&mut *conn, &sale.company_id).await?;
        if open_session.is_none() {
            debug!(sale_id = %sale.id, "No open cash session, recording payments only");
        }

        let postings = plan_sale_postings(
            &self.catalog,
            sale,
            allocations,
            open_session.as_ref(),
            actor,
            Utc::now(),
        );

        for payment in &postings.payments {
            PaymentRepository::insert(&mut *conn, payment).await?;
        }
        for movement in &postings.movements {
            MovementRepository::insert(&mut *conn, movement).await?;
        }

        info!(
            sale_id = %sale.id,
            payments = postings.payments.len(),
            movements = postings.movements.len(),
            session_id = postings.session_id.as_deref().unwrap_or("-"),
            "Sale payments recorded"
        );

        Ok(postings)
    }

    /// Same as [`Self::record`] in a transaction of its own.
    pub async fn record_sale_payments(
        &self,
        sale: &Sale,
        allocations: &[Allocation],
        actor: &Actor,
    ) -> DbResult<SalePostings> {
        let mut tx = self.db.begin().await?;
        let postings = self.record(&mut tx, sale, allocations, actor).await?;
        tx.commit().await?;

        Ok(postings)
    }
}
