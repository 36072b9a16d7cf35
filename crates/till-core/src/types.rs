//! # Domain Types
//!
//! Core domain entities shared by the accounting modules and the storage
//! layer.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Entity Relationships                             │
//! │                                                                         │
//! │   ┌──────────────┐        ┌──────────────┐        ┌───────────────┐    │
//! │   │ CashSession  │ 1    * │ CashMovement │ *    1 │     Sale      │    │
//! │   │ (per company)│───────►│ ENTRY / EXIT │───────►│ (optional)    │    │
//! │   └──────────────┘        └──────────────┘        └───────┬───────┘    │
//! │                                                           │ 1          │
//! │                                                           ▼ *          │
//! │                                                   ┌───────────────┐    │
//! │                                                   │  SalePayment  │    │
//! │                                                   │ one per tender│    │
//! │                                                   └───────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Session and movement records live in [`crate::session`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Payment Method Code
// =============================================================================

/// Code of a payment method (`CASH`, `PIX`, ...).
///
/// The set of valid codes is configuration, see
/// [`PaymentCatalog`](crate::catalog::PaymentCatalog). Codes are stored
/// normalised: trimmed and upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct PaymentMethodCode(String);

impl PaymentMethodCode {
    /// Synthetic code for a sale settled by more than one method.
    /// Never a valid input method.
    pub const MULTI: &'static str = "MULTI";

    /// Normalises raw input (trim + upper-case).
    pub fn new(raw: impl AsRef<str>) -> Self {
        PaymentMethodCode(raw.as_ref().trim().to_uppercase())
    }

    /// The `MULTI` code.
    pub fn multi() -> Self {
        PaymentMethodCode(Self::MULTI.to_string())
    }

    pub fn is_multi(&self) -> bool {
        self.0 == Self::MULTI
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentMethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PaymentMethodCode {
    fn from(raw: &str) -> Self {
        PaymentMethodCode::new(raw)
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The operator performing an action.
///
/// The name is snapshotted onto session records so reports stay readable
/// after the user is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The company (store) a till belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
}

impl Company {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Company {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Direction of a cash movement relative to the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Money into the drawer (sale tender, float top-up).
    Entry,
    /// Money out of the drawer (change, withdrawal).
    Exit,
}

impl MovementType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "ENTRY",
            MovementType::Exit => "EXIT",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle state of a cash session. `Open -> Closed` is the only
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "OPEN",
            SessionStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// Tender Input / Allocation
// =============================================================================

/// One validated tender line: a method and the amount handed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub method: PaymentMethodCode,
    pub tendered: Money,
}

impl PaymentEntry {
    pub fn new(method: impl Into<PaymentMethodCode>, tendered: Money) -> Self {
        PaymentEntry {
            method: method.into(),
            tendered,
        }
    }
}

/// How one tender was split between the sale and change.
///
/// `applied + change == tendered` always holds. Change is only ever
/// non-zero for the cash method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub method: PaymentMethodCode,
    pub tendered: Money,
    pub applied: Money,
    pub change: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// A finalised sale, as persisted.
///
/// Money columns are stored as integer cents (`*_cents`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub company_id: String,
    /// Human-facing code, `YYYYMMDD-NNNNN`, unique per company.
    pub code: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sub_total_cents"))]
    pub sub_total: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tax_amount_cents"))]
    pub tax_amount: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delivery_fee_cents"))]
    pub delivery_fee: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "discount_total_cents"))]
    pub discount_total: Money,
    pub discount_reason: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "grand_total_cents"))]
    pub grand_total: Money,
    /// Sum of every tender handed over.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tendered_amount_cents"))]
    pub tendered_amount: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "change_amount_cents"))]
    pub change_amount: Money,
    /// Single method, or `MULTI`.
    pub primary_method: PaymentMethodCode,
    pub customer_name: Option<String>,
    pub delivery_address: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One tender line recorded against a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalePayment {
    pub id: String,
    pub company_id: String,
    pub sale_id: String,
    pub method: PaymentMethodCode,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tendered_cents"))]
    pub tendered: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "applied_cents"))]
    pub applied: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "change_cents"))]
    pub change: Money,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Table Order
// =============================================================================

/// Status of a dine-in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableOrderStatus {
    Open,
    Closed,
}

/// A dine-in table order. Only its status matters here: a company with
/// open table orders cannot close its cash session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TableOrder {
    pub id: String,
    pub company_id: String,
    pub label: String,
    pub status: TableOrderStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
