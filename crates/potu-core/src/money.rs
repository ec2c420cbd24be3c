//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Storage, Decimal Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client JSON           Money (in memory)          Client JSON           │
//! │                                                                         │
//! │  "price": 89.99  ──►   Money(8999) cents   ──►    "price": 89.99        │
//! │  "price": "89.99" ─┘                                                    │
//! │                                                                         │
//! │  Sums, line totals and tax are computed on integer cents, so            │
//! │  2 × 89.99 is exactly 179.98 and never 179.97999999999999.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use potu_core::money::Money;
//!
//! let price = Money::from_cents(8999); // 89.99
//! let line = price * 2;
//! assert_eq!(line.to_string(), "179.98");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paisa for BDT, cents for USD).
///
/// Serialized as a JSON number with two decimals so the frontend keeps
/// working with plain numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use potu_core::money::Money;
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
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a decimal amount, rounding to the nearest cent.
    ///
    /// Returns `None` for NaN or infinite input.
    ///
    /// ```rust
    /// use potu_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(89.99), Some(Money::from_cents(8999)));
    /// assert_eq!(Money::from_decimal(f64::NAN), None);
    /// ```
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        Some(Money((amount * 100.0).round() as i64))
    }

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

    /// Returns the amount as a float, for display and JSON only.
    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax, rounding half up on integer cents.
    ///
    /// `(amount * bps + 5000) / 10000`, in i128 to avoid overflow.
    ///
    /// ```rust
    /// use potu_core::money::Money;
    /// use potu_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(17998);
    /// let vat = subtotal.calculate_tax(TaxRate::from_bps(1000));
    /// assert_eq!(vat.cents(), 1800); // 17.998 → 18.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies a unit price by a quantity, clamping at the i64 range.
    ///
    /// Request input goes through [`Money::checked_multiply_quantity`] during
    /// validation, so stored amounts never reach the clamp.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when `price × qty` does not fit in cents.
    ///
    /// ```rust
    /// use potu_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(8999).checked_multiply_quantity(2), Some(Money::from_cents(17998)));
    /// assert_eq!(Money::from_cents(2999).checked_multiply_quantity(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Average of `total` over `count` parts, zero when `count` is zero.
    ///
    /// ```rust
    /// use potu_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).average_over(0), Money::zero());
    /// assert_eq!(Money::from_cents(1000).average_over(3).cents(), 333);
    /// ```
    pub fn average_over(&self, count: usize) -> Money {
        if count == 0 {
            return Money::zero();
        }
        let avg = (self.0 as i128 * 2 + count as i128) / (2 * count as i128);
        Money(avg as i64)
    }
}

// =============================================================================
// Display
// =============================================================================

/// Formats as a plain two-decimal amount: `179.98`, `-5.50`.
/// Currency labels are added by the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), self.minor())
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(v.saturating_mul(100)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map(|v| Money(v.saturating_mul(100)))
            .map_err(|_| E::custom("amount out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_decimal(v).ok_or_else(|| E::custom("amount must be a finite number"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(Money::zero());
        }
        let parsed: f64 = trimmed
            .parse()
            .map_err(|_| E::custom(format!("invalid amount '{}'", v)))?;
        self.visit_f64(parsed)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Arithmetic Operators
// =============================================================================
//
// Operators saturate instead of overflowing. Validation bounds every amount
// that reaches the store, so the clamp only guards report sums.

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, qty: i64) -> Money {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(17998).to_string(), "179.98");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_line_total_is_exact() {
        let price = Money::from_decimal(89.99).unwrap();
        assert_eq!((price * 2).cents(), 17998);
    }

    #[test]
    fn test_tax_rounding() {
        let rate = TaxRate::from_bps(1000);
        assert_eq!(Money::from_cents(17998).calculate_tax(rate).cents(), 1800);
        assert_eq!(Money::from_cents(1004).calculate_tax(rate).cents(), 100);
        assert_eq!(Money::from_cents(1005).calculate_tax(rate).cents(), 101);
    }

    #[test]
    fn test_serializes_as_decimal_number() {
        let json = serde_json::to_string(&Money::from_cents(17998)).unwrap();
        assert_eq!(json, "179.98");
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_float: Money = serde_json::from_str("89.99").unwrap();
        let from_int: Money = serde_json::from_str("12").unwrap();
        let from_str: Money = serde_json::from_str("\"45.5\"").unwrap();
        assert_eq!(from_float.cents(), 8999);
        assert_eq!(from_int.cents(), 1200);
        assert_eq!(from_str.cents(), 4550);
        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }

    #[test]
    fn test_sum() {
        let items = [Money::from_cents(100), Money::from_cents(250)];
        let total: Money = items.iter().sum();
        assert_eq!(total.cents(), 350);
    }

    #[test]
    fn test_overflow_is_detected_or_clamped() {
        let price = Money::from_cents(2999);
        assert_eq!(price.checked_multiply_quantity(i64::MAX), None);
        assert_eq!(price.multiply_quantity(i64::MAX).cents(), i64::MAX);
        assert_eq!((price * i64::MAX).cents(), i64::MAX);

        let big = Money::from_cents(i64::MAX - 1);
        assert_eq!(big.checked_add(Money::from_cents(2)), None);
        assert_eq!((big + Money::from_cents(2)).cents(), i64::MAX);
        let total: Money = [big, big].iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn test_average_over_empty_is_zero() {
        assert_eq!(Money::from_cents(0).average_over(0), Money::zero());
        assert_eq!(Money::from_cents(1001).average_over(2).cents(), 501);
    }
}
