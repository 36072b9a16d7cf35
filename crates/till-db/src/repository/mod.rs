//! # Repositories
//!
//! One repository per table.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  &self methods          → run on the pool (standalone reads)           │
//! │  Repo::fn(conn, ..)     → run on a caller's connection, usually        │
//! │                           `&mut *tx`, so several writes share one       │
//! │                           transaction                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod movement;
pub mod payment;
pub mod sale;
pub mod session;
pub mod table_order;

pub use movement::MovementRepository;
pub use payment::PaymentRepository;
pub use sale::SaleRepository;
pub use session::SessionRepository;
pub use table_order::TableOrderRepository;
