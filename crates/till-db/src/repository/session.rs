//! # Cash Session Repository
//!
//! ## Session Lifecycle in Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert()  status = 'open'                                             │
//! │     │      partial UNIQUE(company_id) WHERE status = 'open'            │
//! │     ▼                                                                   │
//! │  close()   UPDATE ... WHERE id = ? AND status = 'open'                 │
//! │            0 rows affected → someone else closed it first              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::SessionRecord;

const SESSION_COLUMNS: &str = "id, company_id, company_name, status, \
     opened_by, opened_by_name, opened_at, opening_amount_cents, opening_note, \
     closed_by, closed_by_name, closed_at, closing_amount_cents, closing_note";

/// Repository for cash session rows.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SessionRecord>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1");
        let session = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Gets the company's OPEN session, if any.
    pub async fn find_open(&self, company_id: &str) -> DbResult<Option<SessionRecord>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE company_id = ?1 AND status = 'open' \
             ORDER BY opened_at DESC LIMIT 1"
        );
        let session = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Latest sessions of a company, newest first.
    pub async fn list_recent(&self, company_id: &str, limit: i64) -> DbResult<Vec<SessionRecord>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE company_id = ?1 \
             ORDER BY opened_at DESC LIMIT ?2"
        );
        let sessions = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(company_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Sessions opened in `[start, end)`, newest first.
    pub async fn list_opened_between(
        &self,
        company_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<SessionRecord>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE company_id = ?1 AND opened_at >= ?2 AND opened_at < ?3 \
             ORDER BY opened_at DESC"
        );
        let sessions = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(company_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    /// Number of sessions a company has ever opened.
    pub async fn count(&self, company_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cash_sessions WHERE company_id = ?1")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Unit-of-work operations
    // =========================================================================

    /// Gets a session by ID on the caller's connection.
    pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<SessionRecord>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1");
        let session = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(session)
    }

    /// Gets the company's OPEN session on the caller's connection.
    pub async fn find_open_in(
        conn: &mut SqliteConnection,
        company_id: &str,
    ) -> DbResult<Option<SessionRecord>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE company_id = ?1 AND status = 'open' \
             ORDER BY opened_at DESC LIMIT 1"
        );
        let session = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(company_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(session)
    }

    /// Inserts a new session row.
    ///
    /// A second OPEN session for the same company fails with
    /// `DbError::UniqueViolation` on `cash_sessions.company_id`.
    pub async fn insert(conn: &mut SqliteConnection, session: &SessionRecord) -> DbResult<()> {
        debug!(id = %session.id, company_id = %session.company_id, "Inserting cash session");

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, company_id, company_name, status,
                opened_by, opened_by_name, opened_at, opening_amount_cents, opening_note,
                closed_by, closed_by_name, closed_at, closing_amount_cents, closing_note
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&session.id)
        .bind(&session.company_id)
        .bind(&session.company_name)
        .bind(session.status)
        .bind(&session.opened_by)
        .bind(&session.opened_by_name)
        .bind(session.opened_at)
        .bind(session.opening_amount)
        .bind(&session.opening_note)
        .bind(&session.closed_by)
        .bind(&session.closed_by_name)
        .bind(session.closed_at)
        .bind(session.closing_amount)
        .bind(&session.closing_note)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Persists the closing fields of a session that is still OPEN in
    /// storage.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no OPEN row with that id
    pub async fn close(conn: &mut SqliteConnection, session: &SessionRecord) -> DbResult<()> {
        debug!(id = %session.id, "Closing cash session");

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions
            SET status = 'closed',
                closed_by = ?1,
                closed_by_name = ?2,
                closed_at = ?3,
                closing_amount_cents = ?4,
                closing_note = ?5
            WHERE id = ?6 AND status = 'open'
            "#,
        )
        .bind(&session.closed_by)
        .bind(&session.closed_by_name)
        .bind(session.closed_at)
        .bind(session.closing_amount)
        .bind(&session.closing_note)
        .bind(&session.id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open cash session", &session.id));
        }

        Ok(())
    }
}
