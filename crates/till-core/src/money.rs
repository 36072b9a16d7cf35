//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A drawer that takes 1,000 sales a day drifts by cents per week.       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is quantized to 2 places ONCE, at the boundary,        │
//! │    then carried as i64 cents. Sums and differences are exact.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Parsing
//! Tender amounts arrive as strings. They are parsed with `rust_decimal`
//! and quantized with **round half-up** (midpoint away from zero):
//!
//! ```rust
//! use till_core::money::Money;
//!
//! assert_eq!(Money::parse("99.995"), Some(Money::from_cents(10000)));
//! assert_eq!(Money::parse("10.004"), Some(Money::from_cents(1000)));
//! assert_eq!(Money::parse("abc"), None);
//! assert_eq!(Money::parse_lenient("abc"), Money::zero());
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of fractional digits carried by every monetary value.
pub const DECIMAL_PLACES: u32 = 2;

/// Largest magnitude accepted from decimal input: 1 trillion major units.
///
/// Anything larger is treated as unparseable, so tender lines that large
/// are skipped like other garbage. Summing tens of thousands of capped
/// amounts still fits in i64 cents.
pub const MAX_CENTS: i64 = 100_000_000_000_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences at close can be negative (shortage)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as integer cents**: no float ever crosses a boundary
///
/// ## Where Money is Used
/// ```text
/// raw tender "200.00" ──► Money::parse ──► PaymentEntry.tendered
///                                              │
///                                              ▼
///                         Allocation { tendered, applied, change }
///                                              │
///                                              ▼
///                         CashMovement.amount ──► expected balance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Quantizes a decimal to 2 places, rounding half-up.
    ///
    /// Returns `None` when the magnitude exceeds [`MAX_CENTS`].
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let rounded =
            value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .filter(|cents| cents.checked_abs().is_some_and(|abs| abs <= MAX_CENTS))
            .map(Money)
    }

    /// Parses a decimal string and quantizes it to cents (round half-up).
    ///
    /// Accepts plain (`"12.5"`) and scientific (`"1.25e1"`) notation,
    /// surrounding whitespace is ignored. Returns `None` for anything else,
    /// including amounts beyond [`MAX_CENTS`].
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
            .and_then(Money::from_decimal)
    }

    /// Parses like [`Money::parse`], mapping unparseable input to zero.
    ///
    /// Tender input uses this: a garbage amount becomes 0 and the entry is
    /// then skipped as non-positive instead of failing the whole checkout.
    pub fn parse_lenient(raw: &str) -> Self {
        Money::parse(raw).unwrap_or_default()
    }

    /// Returns the value as an exact decimal with 2 fractional digits.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Clamps negative values to zero.
    #[inline]
    pub fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, e.g. `350.00` or `-5.00`.
///
/// Currency symbols and locale are a rendering concern of the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        f.pad(&format!("{}{}.{:02}", sign, self.major().abs(), self.minor()))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// Arithmetic saturates at the i64 bounds instead of panicking or wrapping.

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
