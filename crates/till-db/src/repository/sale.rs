//! # Sale Repository
//!
//! Sale headers and their per-company codes.
//!
//! ## Sale Codes
//! ```text
//! YYYYMMDD-NNNNN      20260315-00001, 20260315-00002, ...
//!   │        └── sequence per company and day, 5 digits
//!   └── sale date (UTC)
//! ```
//! The sequence is computed inside the checkout transaction;
//! `UNIQUE(company_id, code)` catches any collision.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use till_core::Sale;

const SALE_COLUMNS: &str = "id, company_id, code, sub_total_cents, tax_amount_cents, \
     delivery_fee_cents, discount_total_cents, discount_reason, grand_total_cents, \
     tendered_amount_cents, change_amount_cents, primary_method, customer_name, \
     delivery_address, created_by, created_at";

/// Repository for sale rows.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, scoped to a company.
    pub async fn get_by_id(&self, company_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE company_id = ?1 AND id = ?2");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(company_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Sales linked to at least one movement of the session, by code.
    pub async fn list_for_session_in(
        conn: &mut SqliteConnection,
        session_id: &str,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE id IN (SELECT sale_id FROM cash_movements \
                          WHERE session_id = ?1 AND sale_id IS NOT NULL) \
             ORDER BY code"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(session_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(sales)
    }

    /// Next free code for the company on `day`.
    pub async fn next_code_in(
        conn: &mut SqliteConnection,
        company_id: &str,
        day: NaiveDate,
    ) -> DbResult<String> {
        let prefix = day.format("%Y%m%d").to_string();

        let last: Option<String> = sqlx::query_scalar(
            "SELECT code FROM sales WHERE company_id = ?1 AND code LIKE ?2 ORDER BY code DESC LIMIT 1",
        )
        .bind(company_id)
        .bind(format!("{prefix}-%"))
        .fetch_optional(&mut *conn)
        .await?;

        let next = last
            .as_deref()
            .and_then(|code| code.rsplit('-').next())
            .and_then(|seq| seq.parse::<u32>().ok())
            .unwrap_or(0)
            + 1;

        Ok(format!("{prefix}-{next:05}"))
    }

    /// Inserts a sale header.
    pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, code = %sale.code, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, company_id, code,
                sub_total_cents, tax_amount_cents, delivery_fee_cents,
                discount_total_cents, discount_reason, grand_total_cents,
                tendered_amount_cents, change_amount_cents, primary_method,
                customer_name, delivery_address, created_by, created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.company_id)
        .bind(&sale.code)
        .bind(sale.sub_total)
        .bind(sale.tax_amount)
        .bind(sale.delivery_fee)
        .bind(sale.discount_total)
        .bind(&sale.discount_reason)
        .bind(sale.grand_total)
        .bind(sale.tendered_amount)
        .bind(sale.change_amount)
        .bind(&sale.primary_method)
        .bind(&sale.customer_name)
        .bind(&sale.delivery_address)
        .bind(&sale.created_by)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
