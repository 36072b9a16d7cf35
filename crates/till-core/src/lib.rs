//! # till-core: Pure Money Accounting for Till POS
//!
//! This crate holds the accounting rules of the till: tender allocation,
//! the cash-session ledger and its reconciliation. It performs no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    till-cli (commands)                          │   │
//! │  │    open ──► checkout ──► movement ──► close ──► report          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               till-db (transactions, repositories)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │  money   │  │ payment  │  │ session  │  │   report     │   │   │
//! │  │   │  Money   │  │ parser   │  │ CashSess.│  │ SessionRep.  │   │   │
//! │  │   │          │  │ allocator│  │ movements│  │              │   │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cent `Money`, half-up parsing
//! - [`catalog`] - Configured payment methods
//! - [`payment`] - Tender parsing, allocation, primary method
//! - [`session`] - Cash session aggregate and movement log
//! - [`ledger`] - Which payments and movements a sale posts
//! - [`sale`] - Grand total from sub-total, tax, delivery, discount
//! - [`report`] - Session report facts
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::{settle_payment, Money, PaymentCatalog};
//!
//! let catalog = PaymentCatalog::default();
//! let settlement = settle_payment(
//!     &catalog,
//!     Money::parse("150.00"),
//!     &["CASH"],
//!     &["200.00"],
//! )
//! .unwrap();
//!
//! assert_eq!(settlement.change_total, Money::from_cents(5000));
//! assert_eq!(settlement.primary_method.as_str(), "CASH");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod money;
pub mod payment;
pub mod report;
pub mod sale;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{PaymentCatalog, PaymentMethodInfo};
pub use error::{CoreError, CoreResult, ErrorKind, PaymentError, SessionError, ValidationError};
pub use ledger::{plan_sale_postings, SalePostings};
pub use money::Money;
pub use payment::{
    allocate_payments, parse_payment_entries, resolve_primary_method, settle_payment,
    AllocationOutcome, Settlement,
};
pub use report::{SessionReport, SessionReportBuilder};
pub use sale::{SaleAmounts, SaleTotals};
pub use session::{
    CashMovement, CashSession, ClosedSessionFacts, ManualMovementInput, SessionRecord,
    SessionTotals,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest free text accepted for notes, descriptions and discount reasons.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Sessions listed by the history view when no date is given.
pub const DEFAULT_HISTORY_LIMIT: i64 = 5;
