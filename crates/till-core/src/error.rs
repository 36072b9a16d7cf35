//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── PaymentError     - Tender parsing / allocation rejections         │
//! │  ├── SessionError     - Cash session lifecycle rejections              │
//! │  ├── ValidationError  - Field-level input failures                     │
//! │  └── CoreError        - Umbrella over the three above                  │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  ├── DbError          - Storage failures                               │
//! │  └── ServiceError     - CoreError | DbError returned by use cases      │
//! │                                                                         │
//! │  Every error exposes a stable `ErrorKind` plus a readable message.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All of these are recoverable: they reject one operation, never the
//! process.

use serde::Serialize;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable machine-readable error code.
///
/// Serialized in `SCREAMING_SNAKE_CASE` so front ends can branch on it:
/// `"UNDER_PAYMENT"`, `"ALREADY_OPEN"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NoPaymentProvided,
    InvalidMethod,
    InvalidDueAmount,
    OverpaymentNotCash,
    ExcessNotCash,
    UnderPayment,
    AlreadyOpen,
    NotOpen,
    OpenOrdersExist,
    Validation,
    NotFound,
    InvalidCatalog,
    Storage,
}

impl ErrorKind {
    /// Returns the code as it appears on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoPaymentProvided => "NO_PAYMENT_PROVIDED",
            ErrorKind::InvalidMethod => "INVALID_METHOD",
            ErrorKind::InvalidDueAmount => "INVALID_DUE_AMOUNT",
            ErrorKind::OverpaymentNotCash => "OVERPAYMENT_NOT_CASH",
            ErrorKind::ExcessNotCash => "EXCESS_NOT_CASH",
            ErrorKind::UnderPayment => "UNDER_PAYMENT",
            ErrorKind::AlreadyOpen => "ALREADY_OPEN",
            ErrorKind::NotOpen => "NOT_OPEN",
            ErrorKind::OpenOrdersExist => "OPEN_ORDERS_EXIST",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidCatalog => "INVALID_CATALOG",
            ErrorKind::Storage => "STORAGE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Error
// =============================================================================

/// Rejections raised while turning raw tender input into allocations.
///
/// All of them are detected before anything is written: a sale that fails
/// here never reaches storage.
///
/// ## User Workflow
/// ```text
/// Cashier enters [PIX 100.00] for a 80.00 sale
///      │
///      ▼
/// allocate_payments ── PIX exceeds remaining 80.00
///      │
///      ▼
/// ExcessNotCash { method: "PIX", .. }
///      │
///      ▼
/// UI shows: "PIX tender 100.00 exceeds the 80.00 still due"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// No usable tender after filtering (no pairs, or all non-positive).
    #[error("Provide at least one payment with a positive amount")]
    NoPaymentProvided,

    /// A non-empty method outside the configured catalog.
    #[error("Invalid payment method: {method}")]
    InvalidMethod { method: String },

    /// The sale total is missing or not positive.
    #[error("Sale total must be greater than zero")]
    InvalidDueAmount,

    /// A non-cash tender arrived after the total was already covered.
    #[error("After the total is covered, additional payments are only allowed in cash (got {method})")]
    OverpaymentNotCash { method: String },

    /// A non-cash tender is larger than what is still due.
    #[error("{method} tender {tendered} exceeds the {remaining} still due")]
    ExcessNotCash {
        method: String,
        tendered: Money,
        remaining: Money,
    },

    /// The tenders do not cover the sale total.
    #[error("Payments do not cover the sale total ({remaining} still due)")]
    UnderPayment { remaining: Money },
}

impl PaymentError {
    /// Returns the stable error code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::NoPaymentProvided => ErrorKind::NoPaymentProvided,
            PaymentError::InvalidMethod { .. } => ErrorKind::InvalidMethod,
            PaymentError::InvalidDueAmount => ErrorKind::InvalidDueAmount,
            PaymentError::OverpaymentNotCash { .. } => ErrorKind::OverpaymentNotCash,
            PaymentError::ExcessNotCash { .. } => ErrorKind::ExcessNotCash,
            PaymentError::UnderPayment { .. } => ErrorKind::UnderPayment,
        }
    }
}

// =============================================================================
// Session Error
// =============================================================================

/// Cash session lifecycle rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The company already has an OPEN session.
    #[error("A cash session is already open for company {company_id}")]
    AlreadyOpen { company_id: String },

    /// The session is closed, or the company has no open session.
    #[error("No open cash session: {reference}")]
    NotOpen { reference: String },

    /// Close blocked while table orders are still open.
    #[error("Cannot close the cash session while {count} table order(s) are open")]
    OpenOrdersExist { count: i64 },
}

impl SessionError {
    /// Returns the stable error code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::AlreadyOpen { .. } => ErrorKind::AlreadyOpen,
            SessionError::NotOpen { .. } => ErrorKind::NotOpen,
            SessionError::OpenOrdersExist { .. } => ErrorKind::OpenOrdersExist,
        }
    }

    /// Creates a NotOpen error for a session or company reference.
    pub fn not_open(reference: impl Into<String>) -> Self {
        SessionError::NotOpen {
            reference: reference.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of free-form fields before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Umbrella error for till-core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Entity cannot be found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The payment-method catalog is inconsistent.
    #[error("Invalid payment catalog: {reason}")]
    InvalidCatalog { reason: String },
}

impl CoreError {
    /// Returns the stable error code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Payment(e) => e.kind(),
            CoreError::Session(e) => e.kind(),
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidCatalog { .. } => ErrorKind::InvalidCatalog,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for tender parsing and allocation.
pub type PaymentResult<T> = Result<T, PaymentError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_error_messages() {
        let err = PaymentError::ExcessNotCash {
            method: "PIX".to_string(),
            tendered: Money::from_cents(10000),
            remaining: Money::from_cents(8000),
        };
        assert_eq!(err.to_string(), "PIX tender 100.00 exceeds the 80.00 still due");

        let err = PaymentError::UnderPayment {
            remaining: Money::from_cents(1),
        };
        assert_eq!(
            err.to_string(),
            "Payments do not cover the sale total (0.01 still due)"
        );
    }

    #[test]
    fn test_kinds_survive_wrapping() {
        let err: CoreError = PaymentError::InvalidDueAmount.into();
        assert_eq!(err.kind(), ErrorKind::InvalidDueAmount);

        let err: CoreError = SessionError::OpenOrdersExist { count: 2 }.into();
        assert_eq!(err.kind(), ErrorKind::OpenOrdersExist);

        let err: CoreError = ValidationError::required("description").into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Validation error: description is required");
    }

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::OverpaymentNotCash).unwrap();
        assert_eq!(json, "\"OVERPAYMENT_NOT_CASH\"");
        assert_eq!(ErrorKind::OverpaymentNotCash.as_str(), "OVERPAYMENT_NOT_CASH");
    }
}
