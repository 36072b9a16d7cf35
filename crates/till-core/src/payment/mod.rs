//! # Payment Module
//!
//! Raw tender input to settled allocations.
//!
//! ```text
//! raw methods ─┐
//!              ├─► parse_payment_entries ─► allocate_payments ─► resolve_primary_method
//! raw amounts ─┘        (parser)               (allocator)            (primary)
//!                                                   │
//!                                                   ▼
//!                                              Settlement
//! ```
//!
//! Everything here is pure: a rejected tender never reaches storage.

mod allocator;
mod parser;
mod primary;

pub use allocator::{allocate_payments, AllocationOutcome};
pub use parser::parse_payment_entries;
pub use primary::resolve_primary_method;

use serde::Serialize;

use crate::catalog::PaymentCatalog;
use crate::error::PaymentResult;
use crate::money::Money;
use crate::types::{Allocation, PaymentMethodCode};

/// Fully validated payment for one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub allocations: Vec<Allocation>,
    pub tendered_total: Money,
    pub change_total: Money,
    pub primary_method: PaymentMethodCode,
}

/// Parses, allocates and classifies a sale's tender in one step.
pub fn settle_payment<M, A>(
    catalog: &PaymentCatalog,
    due: Option<Money>,
    raw_methods: &[M],
    raw_amounts: &[A],
) -> PaymentResult<Settlement>
where
    M: AsRef<str>,
    A: AsRef<str>,
{
    let entries = parse_payment_entries(catalog, raw_methods, raw_amounts)?;
    let outcome = allocate_payments(catalog, due, &entries)?;
    let primary_method = resolve_primary_method(catalog, &outcome.allocations);

    Ok(Settlement {
        allocations: outcome.allocations,
        tendered_total: outcome.tendered_total,
        change_total: outcome.change_total,
        primary_method,
    })
}
