//! # till-db: Storage and Use Cases for Till POS
//!
//! SQLite storage for the cash-drawer ledger, with the transactional use
//! cases that drive it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Data Flow                               │
//! │                                                                         │
//! │  till-cli (open / checkout / close / report)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ CashDesk      │───►│ SessionRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Checkout      │    │ MovementRepo  │    │              │  │   │
//! │  │   │ Report        │    │ SaleRepo      │    │              │  │   │
//! │  │   │ Recorder      │    │ PaymentRepo   │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ pure rules                                          │   │
//! │  │           ▼                                                     │   │
//! │  │        till-core                                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and service error types
//! - [`repository`] - Row access per table
//! - [`recorder`] - Sale payments and their cash movements
//! - [`services`] - Cash desk, checkout and report use cases
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{CashDeskService, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//! db.run_migrations().await?;
//!
//! let desk = CashDeskService::new(db.clone(), PaymentCatalog::default());
//! let session = desk.open_session(&company, &actor, Money::from_cents(200_00), None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod recorder;
pub mod repository;
pub mod services;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};
pub use recorder::SalePaymentRecorder;

pub use repository::{
    MovementRepository, PaymentRepository, SaleRepository, SessionRepository, TableOrderRepository,
};
pub use services::{
    CashDeskService, CheckoutReceipt, CheckoutRequest, CheckoutService, PaymentSummaryLine,
    ReportService, SessionHistory, SessionOverview,
};
