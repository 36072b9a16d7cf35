//! Derives the single method code stored on a sale.

use std::collections::BTreeSet;

use crate::catalog::PaymentCatalog;
use crate::types::{Allocation, PaymentMethodCode};

/// Returns the sale's primary payment method.
///
/// - No allocations: the catalog's fallback method
/// - Exactly one distinct method with a positive applied amount: that method
/// - Otherwise: `MULTI`
///
/// Descriptive only. Ledger posting is always per allocation.
pub fn resolve_primary_method(
    catalog: &PaymentCatalog,
    allocations: &[Allocation],
) -> PaymentMethodCode {
    if allocations.is_empty() {
        return catalog.fallback_method.clone();
    }

    let applied: BTreeSet<&PaymentMethodCode> = allocations
        .iter()
        .filter(|a| a.applied.is_positive())
        .map(|a| &a.method)
        .collect();

    let mut methods = applied.into_iter();
    match (methods.next(), methods.next()) {
        (Some(only), None) => only.clone(),
        _ => PaymentMethodCode::multi(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn allocation(method: &str, applied: i64, change: i64) -> Allocation {
        Allocation {
            method: method.into(),
            tendered: Money::from_cents(applied + change),
            applied: Money::from_cents(applied),
            change: Money::from_cents(change),
        }
    }

    #[test]
    fn test_empty_uses_fallback() {
        let catalog = PaymentCatalog::default();
        assert_eq!(resolve_primary_method(&catalog, &[]).as_str(), "PIX");
    }

    #[test]
    fn test_single_method() {
        let catalog = PaymentCatalog::default();
        let allocations = [allocation("CASH", 3000, 0), allocation("CASH", 2000, 500)];
        assert_eq!(resolve_primary_method(&catalog, &allocations).as_str(), "CASH");
    }

    #[test]
    fn test_mixed_methods_are_multi() {
        let catalog = PaymentCatalog::default();
        let allocations = [allocation("CASH", 5000, 0), allocation("PIX", 5000, 0)];
        assert!(resolve_primary_method(&catalog, &allocations).is_multi());
    }

    #[test]
    fn test_zero_applied_methods_are_ignored() {
        let catalog = PaymentCatalog::default();
        let allocations = [allocation("CARD_CREDIT", 8000, 0), allocation("CASH", 0, 2000)];
        assert_eq!(
            resolve_primary_method(&catalog, &allocations).as_str(),
            "CARD_CREDIT"
        );
    }

    #[test]
    fn test_nothing_applied_is_multi() {
        let catalog = PaymentCatalog::default();
        let allocations = [allocation("CASH", 0, 2000)];
        assert!(resolve_primary_method(&catalog, &allocations).is_multi());
    }
}
