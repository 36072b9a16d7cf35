//! # Payment Allocator
//!
//! Applies tender entries against the amount due, splitting each into the
//! part that pays the sale and the part handed back as change.
//!
//! ## Algorithm
//! ```text
//! remaining = due
//! for entry in entries (order preserved):
//!     ┌──────────────────────┬────────────────┬──────────────────┬───────────┐
//!     │ case                 │ non-cash       │ applied          │ change    │
//!     ├──────────────────────┼────────────────┼──────────────────┼───────────┤
//!     │ remaining <= 0       │ OverpaymentNot │ 0                │ tendered  │
//!     │ tendered > remaining │ ExcessNotCash  │ remaining        │ t - rem   │
//!     │ otherwise            │ ok             │ tendered         │ 0         │
//!     └──────────────────────┴────────────────┴──────────────────┴───────────┘
//!     remaining -= applied
//! remaining > 0  ──► UnderPayment
//! ```
//!
//! Order matters: when several entries run past the due amount, the ones
//! that cross it first absorb the excess.
//!
//! Every amount is already quantized to whole cents, so the "under by more
//! than 0.009" tolerance is the same as "any cent left unpaid".

use serde::Serialize;

use crate::catalog::PaymentCatalog;
use crate::error::{PaymentError, PaymentResult};
use crate::money::Money;
use crate::types::{Allocation, PaymentEntry};

/// Result of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationOutcome {
    pub allocations: Vec<Allocation>,
    pub tendered_total: Money,
    pub change_total: Money,
}

impl AllocationOutcome {
    /// Sum of applied amounts. Equals the due amount on success.
    pub fn applied_total(&self) -> Money {
        self.allocations.iter().map(|a| a.applied).sum()
    }
}

/// Allocates `entries` against `due`.
///
/// ```rust
/// use till_core::catalog::PaymentCatalog;
/// use till_core::money::Money;
/// use till_core::payment::allocate_payments;
/// use till_core::types::PaymentEntry;
///
/// let catalog = PaymentCatalog::default();
/// let outcome = allocate_payments(
///     &catalog,
///     Some(Money::from_cents(15000)),
///     &[PaymentEntry::new("CASH", Money::from_cents(20000))],
/// )
/// .unwrap();
///
/// assert_eq!(outcome.allocations[0].applied, Money::from_cents(15000));
/// assert_eq!(outcome.change_total, Money::from_cents(5000));
/// ```
pub fn allocate_payments(
    catalog: &PaymentCatalog,
    due: Option<Money>,
    entries: &[PaymentEntry],
) -> PaymentResult<AllocationOutcome> {
    let due = match due {
        Some(due) if due.is_positive() => due,
        _ => return Err(PaymentError::InvalidDueAmount),
    };

    let mut remaining = due;
    let mut tendered_total = Money::zero();
    let mut change_total = Money::zero();
    let mut allocations = Vec::with_capacity(entries.len());

    for entry in entries {
        let tendered = entry.tendered;
        if !tendered.is_positive() {
            continue;
        }
        tendered_total += tendered;

        let is_cash = catalog.is_cash(&entry.method);
        let (applied, change) = if !remaining.is_positive() {
            if !is_cash {
                return Err(PaymentError::OverpaymentNotCash {
                    method: entry.method.to_string(),
                });
            }
            (Money::zero(), tendered)
        } else if tendered > remaining {
            if !is_cash {
                return Err(PaymentError::ExcessNotCash {
                    method: entry.method.to_string(),
                    tendered,
                    remaining,
                });
            }
            (remaining, tendered - remaining)
        } else {
            (tendered, Money::zero())
        };

        remaining -= applied;
        change_total += change;

        allocations.push(Allocation {
            method: entry.method.clone(),
            tendered,
            applied,
            change,
        });
    }

    if remaining.is_positive() {
        return Err(PaymentError::UnderPayment { remaining });
    }

    Ok(AllocationOutcome {
        allocations,
        tendered_total,
        change_total,
    })
}
