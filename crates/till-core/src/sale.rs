//! Sale totals assembly.
//!
//! The discount arrives pre-computed (no eligibility rules here). This
//! module only clamps it and derives the grand total the tender is
//! allocated against.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{truncate_chars, ValidationResult};
use crate::MAX_TEXT_LENGTH;

/// Raw money figures of a sale as submitted by the register.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleAmounts {
    pub sub_total: Money,
    pub tax_amount: Money,
    pub delivery_fee: Money,
    pub discount: Money,
    pub discount_reason: Option<String>,
}

/// Clamped figures ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleTotals {
    pub sub_total: Money,
    pub tax_amount: Money,
    pub delivery_fee: Money,
    pub discount_total: Money,
    pub discount_reason: Option<String>,
    pub grand_total: Money,
}

impl SaleTotals {
    /// Derives the grand total.
    ///
    /// ## Rules
    /// - Negative delivery fee and negative discount read as 0
    /// - Discount is capped at `sub_total + tax + delivery`
    /// - A positive discount needs a reason (trimmed, cut to 255 chars)
    /// - A zero discount drops the reason
    /// - Grand total never goes below 0
    ///
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::sale::{SaleAmounts, SaleTotals};
    ///
    /// let totals = SaleTotals::compute(SaleAmounts {
    ///     sub_total: Money::from_cents(10000),
    ///     delivery_fee: Money::from_cents(500),
    ///     discount: Money::from_cents(1500),
    ///     discount_reason: Some("loyalty".into()),
    ///     ..Default::default()
    /// })
    /// .unwrap();
    /// assert_eq!(totals.grand_total, Money::from_cents(9000));
    /// ```
    pub fn compute(amounts: SaleAmounts) -> ValidationResult<Self> {
        let delivery_fee = amounts.delivery_fee.non_negative();
        let base = amounts.sub_total + amounts.tax_amount + delivery_fee;
        let discount_total = amounts.discount.non_negative().min(base.non_negative());

        let reason = amounts
            .discount_reason
            .as_deref()
            .map(|r| truncate_chars(r, MAX_TEXT_LENGTH))
            .filter(|r| !r.is_empty());

        let discount_reason = if discount_total.is_positive() {
            match reason {
                Some(reason) => Some(reason),
                None => return Err(ValidationError::required("discount_reason")),
            }
        } else {
            None
        };

        Ok(SaleTotals {
            sub_total: amounts.sub_total,
            tax_amount: amounts.tax_amount,
            delivery_fee,
            discount_total,
            discount_reason,
            grand_total: (base - discount_total).non_negative(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(raw: &str) -> Money {
        Money::parse(raw).unwrap()
    }

    fn amounts(sub_total: &str, tax: &str, delivery: &str, discount: &str) -> SaleAmounts {
        SaleAmounts {
            sub_total: money(sub_total),
            tax_amount: money(tax),
            delivery_fee: money(delivery),
            discount: money(discount),
            discount_reason: None,
        }
    }

    #[test]
    fn test_plain_total() {
        let totals = SaleTotals::compute(amounts("100.00", "8.25", "5.00", "0")).unwrap();
        assert_eq!(totals.grand_total, money("113.25"));
        assert_eq!(totals.discount_reason, None);
    }

    #[test]
    fn test_negative_inputs_clamped() {
        let totals = SaleTotals::compute(amounts("50.00", "0", "-5.00", "-3.00")).unwrap();
        assert_eq!(totals.delivery_fee, Money::zero());
        assert_eq!(totals.discount_total, Money::zero());
        assert_eq!(totals.grand_total, money("50.00"));
    }

    #[test]
    fn test_discount_capped_and_total_floored() {
        let mut input = amounts("20.00", "1.00", "2.00", "99.00");
        input.discount_reason = Some("owner".to_string());

        let totals = SaleTotals::compute(input).unwrap();
        assert_eq!(totals.discount_total, money("23.00"));
        assert_eq!(totals.grand_total, Money::zero());
    }

    #[test]
    fn test_discount_requires_reason() {
        let mut input = amounts("20.00", "0", "0", "2.00");
        input.discount_reason = Some("   ".to_string());

        assert_eq!(
            SaleTotals::compute(input),
            Err(ValidationError::required("discount_reason"))
        );
    }

    #[test]
    fn test_reason_truncated_and_cleared() {
        let mut input = amounts("20.00", "0", "0", "2.00");
        input.discount_reason = Some("r".repeat(300));
        let totals = SaleTotals::compute(input).unwrap();
        assert_eq!(totals.discount_reason.map(|r| r.len()), Some(MAX_TEXT_LENGTH));

        let mut input = amounts("20.00", "0", "0", "0");
        input.discount_reason = Some("stale".to_string());
        assert_eq!(SaleTotals::compute(input).unwrap().discount_reason, None);
    }
}
