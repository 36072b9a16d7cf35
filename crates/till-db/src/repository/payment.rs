//! # Sale Payment Repository

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use till_core::SalePayment;

const PAYMENT_COLUMNS: &str = "id, company_id, sale_id, method, tendered_cents, \
     applied_cents, change_cents, recorded_by, recorded_at";

/// Repository for sale payment rows.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// A sale's payments, newest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<SalePayment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM sale_payments \
             WHERE sale_id = ?1 ORDER BY recorded_at DESC, rowid DESC"
        );
        let payments = sqlx::query_as::<_, SalePayment>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Payments of every sale linked to the session's movements.
    pub async fn list_for_session_in(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> DbResult<Vec<SalePayment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM sale_payments \
             WHERE sale_id IN (SELECT sale_id FROM cash_movements \
                               WHERE session_id = ?1 AND sale_id IS NOT NULL) \
             ORDER BY method, recorded_at"
        );
        let payments = sqlx::query_as::<_, SalePayment>(&sql)
            .bind(session_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(payments)
    }

    /// Inserts one payment line.
    pub async fn insert(conn: &mut SqliteConnection, payment: &SalePayment) -> DbResult<()> {
        debug!(
            sale_id = %payment.sale_id,
            method = %payment.method,
            applied = %payment.applied,
            "Inserting sale payment"
        );

        sqlx::query(
            r#"
            INSERT INTO sale_payments (
                id, company_id, sale_id, method,
                tendered_cents, applied_cents, change_cents,
                recorded_by, recorded_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9
            )
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.company_id)
        .bind(&payment.sale_id)
        .bind(&payment.method)
        .bind(payment.tendered)
        .bind(payment.applied)
        .bind(payment.change)
        .bind(&payment.recorded_by)
        .bind(payment.recorded_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
