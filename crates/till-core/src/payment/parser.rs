//! Turns the raw, parallel method/amount lists a checkout form submits into
//! validated [`PaymentEntry`] values.

use crate::catalog::PaymentCatalog;
use crate::error::{PaymentError, PaymentResult};
use crate::money::Money;
use crate::types::{PaymentEntry, PaymentMethodCode};

/// Pairs methods and amounts by position and filters them.
///
/// ## Rules
/// - Lists are zipped; extra elements of the longer list are ignored
/// - Methods are trimmed and upper-cased; a blank method skips the pair
/// - A non-blank method outside the catalog fails with `InvalidMethod`
/// - Amounts are parsed half-up to cents; unparseable reads as 0
/// - Non-positive amounts skip the pair
/// - Nothing left fails with `NoPaymentProvided`
///
/// ```rust
/// use till_core::catalog::PaymentCatalog;
/// use till_core::payment::parse_payment_entries;
///
/// let catalog = PaymentCatalog::default();
/// let entries = parse_payment_entries(&catalog, &[" pix", "cash"], &["30", "60.00"]).unwrap();
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].method.as_str(), "PIX");
/// ```
pub fn parse_payment_entries<M, A>(
    catalog: &PaymentCatalog,
    raw_methods: &[M],
    raw_amounts: &[A],
) -> PaymentResult<Vec<PaymentEntry>>
where
    M: AsRef<str>,
    A: AsRef<str>,
{
    let mut entries = Vec::with_capacity(raw_methods.len().min(raw_amounts.len()));

    for (raw_method, raw_amount) in raw_methods.iter().zip(raw_amounts) {
        let method = PaymentMethodCode::new(raw_method);
        if method.is_empty() {
            continue;
        }
        if !catalog.is_valid_input(&method) {
            return Err(PaymentError::InvalidMethod {
                method: method.to_string(),
            });
        }

        let tendered = Money::parse_lenient(raw_amount.as_ref());
        if !tendered.is_positive() {
            continue;
        }

        entries.push(PaymentEntry { method, tendered });
    }

    if entries.is_empty() {
        return Err(PaymentError::NoPaymentProvided);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PaymentCatalog {
        PaymentCatalog::default()
    }

    #[test]
    fn test_pairs_and_normalises() {
        let entries =
            parse_payment_entries(&catalog(), &["  card_debit ", "CASH"], &["10.5", " 20 "]).unwrap();

        assert_eq!(
            entries,
            vec![
                PaymentEntry::new("CARD_DEBIT", Money::from_cents(1050)),
                PaymentEntry::new("CASH", Money::from_cents(2000)),
            ]
        );
    }

    #[test]
    fn test_zip_shortest() {
        let entries = parse_payment_entries(&catalog(), &["PIX", "CASH"], &["5"]).unwrap();
        assert_eq!(entries.len(), 1);

        let entries = parse_payment_entries(&catalog(), &["PIX"], &["5", "7"]).unwrap();
        assert_eq!(entries, vec![PaymentEntry::new("PIX", Money::from_cents(500))]);
    }

    #[test]
    fn test_skips_blank_methods_and_non_positive_amounts() {
        let entries = parse_payment_entries(
            &catalog(),
            &["", "PIX", "CASH", "CASH"],
            &["50", "0", "-3", "abc"],
        );
        assert_eq!(entries, Err(PaymentError::NoPaymentProvided));

        let entries = parse_payment_entries(&catalog(), &["", "CASH"], &["50", "abc 12"]);
        assert_eq!(entries, Err(PaymentError::NoPaymentProvided));
    }

    #[test]
    fn test_rounds_half_up_and_drops_sub_cent() {
        let entries = parse_payment_entries(&catalog(), &["CASH", "PIX"], &["0.004", "0.005"]).unwrap();
        assert_eq!(entries, vec![PaymentEntry::new("PIX", Money::from_cents(1))]);
    }

    #[test]
    fn test_unknown_method_fails_even_with_zero_amount() {
        let result = parse_payment_entries(&catalog(), &["PIX", "voucher"], &["10", "0"]);
        assert_eq!(
            result,
            Err(PaymentError::InvalidMethod {
                method: "VOUCHER".to_string()
            })
        );
    }

    #[test]
    fn test_multi_is_not_an_input_method() {
        let result = parse_payment_entries(&catalog(), &["MULTI"], &["10"]);
        assert!(matches!(result, Err(PaymentError::InvalidMethod { .. })));
    }

    #[test]
    fn test_empty_input() {
        let none: [&str; 0] = [];
        assert_eq!(
            parse_payment_entries(&catalog(), &none, &none),
            Err(PaymentError::NoPaymentProvided)
        );
    }
}
