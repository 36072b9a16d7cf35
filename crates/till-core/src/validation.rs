//! # Validation Module
//!
//! Input validation for free-form fields and amounts.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: CLI / caller                                                  │
//! │  └── Parsing raw strings into Money, ids                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + domain aggregates                              │
//! │  ├── Required text, length limits                                      │
//! │  └── Amount sign rules                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on cents columns                                │
//! │  └── Partial UNIQUE index: one open session per company                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TEXT_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates required text and returns it trimmed.
///
/// ```rust
/// use till_core::validation::validate_required_text;
///
/// assert_eq!(validate_required_text("description", "  Float ").unwrap(), "Float");
/// assert!(validate_required_text("description", "   ").is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    check_length(field, value)?;
    Ok(value.to_string())
}

/// Validates an optional note. Blank notes become `None`.
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    check_length(field, value)?;
    Ok(Some(value.to_string()))
}

fn check_length(field: &str, value: &str) -> ValidationResult<()> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(())
}

/// Trims and cuts `value` to at most `max` characters (not bytes).
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}

/// Validates an identifier (company, operator).
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Amount Validators
// =============================================================================

/// Amount must be strictly positive (movements).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Amount must be zero or positive (opening / closing counts).
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_text() {
        assert_eq!(validate_required_text("description", " Bank run ").unwrap(), "Bank run");
        assert_eq!(
            validate_required_text("description", ""),
            Err(ValidationError::required("description"))
        );
        let long = "x".repeat(MAX_TEXT_LENGTH + 1);
        assert!(matches!(
            validate_required_text("description", &long),
            Err(ValidationError::TooLong { max: MAX_TEXT_LENGTH, .. })
        ));
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("note", None).unwrap(), None);
        assert_eq!(validate_optional_text("note", Some("  ")).unwrap(), None);
        assert_eq!(
            validate_optional_text("note", Some(" ok ")).unwrap(),
            Some("ok".to_string())
        );
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("  ação  ", 2), "aç");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("company_id", "store-1").is_ok());
        assert!(validate_identifier("company_id", " ").is_err());
        assert!(validate_identifier("company_id", &"a".repeat(65)).is_err());
    }

    #[test]
    fn test_amount_rules() {
        assert!(validate_positive_amount("amount", Money::from_cents(1)).is_ok());
        assert!(validate_positive_amount("amount", Money::zero()).is_err());
        assert!(validate_non_negative_amount("opening_amount", Money::zero()).is_ok());
        assert_eq!(
            validate_non_negative_amount("opening_amount", Money::from_cents(-1)),
            Err(ValidationError::MustNotBeNegative {
                field: "opening_amount".to_string()
            })
        );
    }
}
