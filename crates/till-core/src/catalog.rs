//! # Payment Method Catalog
//!
//! The configured set of payment methods a till accepts.
//!
//! ```text
//! [payments]
//! cash_method = "CASH"
//! fallback_method = "PIX"
//!
//! [[payments.methods]]          valid input set = { CASH, CARD_CREDIT,
//! code = "CASH"                                     CARD_DEBIT, PIX }
//! label = "Cash"                MULTI is never an input method
//! ...
//! ```
//!
//! Loaded from configuration and validated once at the boundary; every
//! payment operation then borrows it.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::PaymentMethodCode;

/// Label shown for a movement or payment with no method.
pub const UNKNOWN_METHOD_LABEL: &str = "N/I";

/// A method code with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodInfo {
    pub code: PaymentMethodCode,
    pub label: String,
}

impl PaymentMethodInfo {
    pub fn new(code: &str, label: &str) -> Self {
        PaymentMethodInfo {
            code: PaymentMethodCode::new(code),
            label: label.to_string(),
        }
    }
}

/// Valid payment methods plus the two special roles: the method that may
/// produce change (cash) and the method assumed when nothing is tendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentCatalog {
    pub methods: Vec<PaymentMethodInfo>,
    pub cash_method: PaymentMethodCode,
    pub fallback_method: PaymentMethodCode,
}

impl Default for PaymentCatalog {
    fn default() -> Self {
        PaymentCatalog {
            methods: vec![
                PaymentMethodInfo::new("CASH", "Cash"),
                PaymentMethodInfo::new("CARD_CREDIT", "Credit card"),
                PaymentMethodInfo::new("CARD_DEBIT", "Debit card"),
                PaymentMethodInfo::new("PIX", "PIX"),
            ],
            cash_method: PaymentMethodCode::new("CASH"),
            fallback_method: PaymentMethodCode::new("PIX"),
        }
    }
}

impl PaymentCatalog {
    /// Checks the catalog is usable.
    ///
    /// ## Rules
    /// - At least one method
    /// - Codes non-empty, already upper-case, unique, never `MULTI`
    /// - Cash and fallback methods belong to the set
    pub fn validate(&self) -> CoreResult<()> {
        if self.methods.is_empty() {
            return Err(invalid("at least one payment method is required"));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.methods.len());
        for info in &self.methods {
            let code = info.code.as_str();
            if code.is_empty() {
                return Err(invalid("payment method codes cannot be empty"));
            }
            if code != code.trim() || code != code.to_uppercase() {
                return Err(invalid(format!("method code {code:?} must be trimmed upper-case")));
            }
            if info.code.is_multi() {
                return Err(invalid(format!(
                    "{} is reserved and cannot be an input method",
                    PaymentMethodCode::MULTI
                )));
            }
            if seen.contains(&code) {
                return Err(invalid(format!("duplicate method code {code}")));
            }
            seen.push(code);
        }

        if !self.contains(&self.cash_method) {
            return Err(invalid(format!(
                "cash method {} is not in the method list",
                self.cash_method
            )));
        }
        if !self.contains(&self.fallback_method) {
            return Err(invalid(format!(
                "fallback method {} is not in the method list",
                self.fallback_method
            )));
        }

        Ok(())
    }

    fn contains(&self, code: &PaymentMethodCode) -> bool {
        self.methods.iter().any(|m| &m.code == code)
    }

    /// Whether `code` may be submitted as a tender method.
    pub fn is_valid_input(&self, code: &PaymentMethodCode) -> bool {
        !code.is_multi() && self.contains(code)
    }

    /// Whether `code` is the change-producing method.
    pub fn is_cash(&self, code: &PaymentMethodCode) -> bool {
        &self.cash_method == code
    }

    /// Display label for a code. `MULTI` reads as "Multiple"; unknown codes
    /// fall back to the code itself.
    pub fn label<'a>(&'a self, code: &'a PaymentMethodCode) -> &'a str {
        if code.is_multi() {
            return "Multiple";
        }
        self.methods
            .iter()
            .find(|m| &m.code == code)
            .map(|m| m.label.as_str())
            .unwrap_or_else(|| code.as_str())
    }

    /// Label for an optional method, `N/I` when absent.
    pub fn label_or_unknown<'a>(&'a self, code: Option<&'a PaymentMethodCode>) -> &'a str {
        match code {
            Some(code) => self.label(code),
            None => UNKNOWN_METHOD_LABEL,
        }
    }
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidCatalog {
        reason: reason.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = PaymentCatalog::default();
        assert!(catalog.validate().is_ok());
        assert!(catalog.is_valid_input(&"pix".into()));
        assert!(catalog.is_cash(&"CASH".into()));
        assert!(!catalog.is_valid_input(&PaymentMethodCode::multi()));
        assert!(!catalog.is_valid_input(&"VOUCHER".into()));
    }

    #[test]
    fn test_labels() {
        let catalog = PaymentCatalog::default();
        let card = PaymentMethodCode::new("CARD_CREDIT");
        assert_eq!(catalog.label(&card), "Credit card");
        assert_eq!(catalog.label(&PaymentMethodCode::multi()), "Multiple");

        let other = PaymentMethodCode::new("VOUCHER");
        assert_eq!(catalog.label(&other), "VOUCHER");
        assert_eq!(catalog.label_or_unknown(None), "N/I");
    }

    #[test]
    fn test_rejects_multi_and_duplicates() {
        let mut catalog = PaymentCatalog::default();
        catalog.methods.push(PaymentMethodInfo::new("MULTI", "Multiple"));
        assert!(matches!(catalog.validate(), Err(CoreError::InvalidCatalog { .. })));

        let mut catalog = PaymentCatalog::default();
        catalog.methods.push(PaymentMethodInfo::new("PIX", "Pix again"));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_cash_or_fallback() {
        let catalog = PaymentCatalog {
            cash_method: PaymentMethodCode::new("MONEY"),
            ..PaymentCatalog::default()
        };
        assert!(catalog.validate().is_err());

        let catalog = PaymentCatalog {
            fallback_method: PaymentMethodCode::new("BOLETO"),
            ..PaymentCatalog::default()
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_rejects_lower_case_codes_from_config() {
        let toml_like = r#"{
            "methods": [{"code": "cash", "label": "Cash"}],
            "cash_method": "cash",
            "fallback_method": "cash"
        }"#;
        let catalog: PaymentCatalog = serde_json::from_str(toml_like).unwrap();
        assert!(catalog.validate().is_err());
    }
}
