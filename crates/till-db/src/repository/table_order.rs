//! Table orders, kept only for the close-session precondition.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::{TableOrder, TableOrderStatus};

/// Repository for table order rows.
#[derive(Debug, Clone)]
pub struct TableOrderRepository {
    pool: SqlitePool,
}

impl TableOrderRepository {
    /// Creates a new TableOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableOrderRepository { pool }
    }

    /// Opens a table order.
    pub async fn open(&self, company_id: &str, label: &str) -> DbResult<TableOrder> {
        let order = TableOrder {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            label: label.to_string(),
            status: TableOrderStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        };

        debug!(id = %order.id, label = %order.label, "Opening table order");

        sqlx::query(
            "INSERT INTO table_orders (id, company_id, label, status, opened_at, closed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&order.id)
        .bind(&order.company_id)
        .bind(&order.label)
        .bind(order.status)
        .bind(order.opened_at)
        .bind(order.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    /// Closes an open table order of the company.
    pub async fn close(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE table_orders SET status = 'closed', closed_at = ?1 \
             WHERE id = ?2 AND company_id = ?3 AND status = 'open'",
        )
        .bind(Utc::now())
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open table order", id));
        }

        Ok(())
    }

    /// Number of open table orders.
    pub async fn count_open(&self, company_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM table_orders WHERE company_id = ?1 AND status = 'open'",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Same as [`Self::count_open`] on the caller's connection.
    pub async fn count_open_in(conn: &mut SqliteConnection, company_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM table_orders WHERE company_id = ?1 AND status = 'open'",
        )
        .bind(company_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }
}
