//! # Cash Movement Repository
//!
//! The movement log is append-only: there is an insert and there are reads,
//! nothing else.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use till_core::CashMovement;

const MOVEMENT_COLUMNS: &str = "id, company_id, session_id, movement_type, amount_cents, \
     payment_method, description, note, sale_id, recorded_by, recorded_at";

/// Repository for cash movement rows.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// A session's movements in the order they were recorded.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let mut conn = self.pool.acquire().await?;
        Self::list_for_session_in(&mut conn, session_id).await
    }

    /// Same as [`Self::list_for_session`] on the caller's connection.
    pub async fn list_for_session_in(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> DbResult<Vec<CashMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM cash_movements \
             WHERE session_id = ?1 ORDER BY recorded_at, rowid"
        );
        let movements = sqlx::query_as::<_, CashMovement>(&sql)
            .bind(session_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(movements)
    }

    /// Appends a movement.
    pub async fn insert(conn: &mut SqliteConnection, movement: &CashMovement) -> DbResult<()> {
        debug!(
            session_id = %movement.session_id,
            movement_type = %movement.movement_type,
            amount = %movement.amount,
            "Inserting cash movement"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_movements (
                id, company_id, session_id, movement_type, amount_cents,
                payment_method, description, note, sale_id, recorded_by, recorded_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11
            )
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.company_id)
        .bind(&movement.session_id)
        .bind(movement.movement_type)
        .bind(movement.amount)
        .bind(&movement.payment_method)
        .bind(&movement.description)
        .bind(&movement.note)
        .bind(&movement.sale_id)
        .bind(&movement.recorded_by)
        .bind(movement.recorded_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
