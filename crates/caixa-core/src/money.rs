//! # Money Module
//!
//! Provides the `Money` type for handling BRL amounts safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  THE INTEGER CENTS PROBLEM                                              │
//! │    10% off R$35,75 = R$3,575 → cents lose the half cent mid-pipeline    │
//! │    and every later discount stage compounds the error                   │
//! │                                                                         │
//! │  OUR SOLUTION: Exact base-10 Decimal                                    │
//! │    35.75 - 3.575 = 32.175 exactly                                       │
//! │    Rounding to cents happens ONCE, for display or the PIX amount        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use caixa_core::money::Money;
//!
//! let price = Money::from_cents(1099); // R$ 10,99
//! let doubled = price * 2;             // R$ 21,98
//! assert_eq!(doubled.cents(), 2198);
//! assert_eq!(doubled.to_string(), "R$ 21,98");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A BRL amount in reais, kept exact until display.
///
/// ## Design Decisions
/// - **Decimal (signed)**: exact sub-cent intermediate values, negatives allowed
///   for arithmetic but the pricing pipeline never yields a negative total
/// - **Single field tuple struct**: zero-cost abstraction over `Decimal`
/// - **Serialized as string**: `"32.175"`, never a lossy JSON number
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  CartItem.unit_price ──► line subtotal ──► discount pipeline            │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │                        CartTotals.total ──► round_to_cents()            │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │                        PixPaymentRequest.amount (field 54)              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps an exact amount in reais.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use caixa_core::money::Money;
    ///
    /// let price = Money::from_cents(1575); // R$ 15,75
    /// assert_eq!(price.amount().to_string(), "15.75");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Returns the exact amount in reais.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the amount rounded to whole centavos.
    ///
    /// Midpoints round away from zero (R$ 32,175 → 3218 centavos), the
    /// convention Brazilian fiscal receipts use.
    pub fn cents(&self) -> i64 {
        let scaled = self
            .round_to_cents()
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .unwrap_or(Decimal::MAX)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        i64::try_from(scaled.mantissa()).unwrap_or(if scaled.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    /// Rounds to two decimal places (display / payment precision).
    pub fn round_to_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies money by a quantity, saturating at `Decimal`'s bounds.
    ///
    /// ## Example
    /// ```rust
    /// use caixa_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(Decimal::from(qty)))
    }

    /// Returns `percent` of this amount, unrounded.
    ///
    /// ## Example
    /// ```rust
    /// use caixa_core::money::Money;
    /// use caixa_core::types::Percent;
    ///
    /// let subtotal = Money::from_cents(3575);
    /// let ten = Percent::from_whole(10).unwrap();
    /// assert_eq!(subtotal.percent_of(ten).amount().to_string(), "3.575");
    /// ```
    pub fn percent_of(&self, percent: Percent) -> Money {
        Money(self.0 * percent.fraction())
    }

    /// Subtracts, flooring the result at zero.
    #[inline]
    pub fn saturating_sub(self, other: Money) -> Money {
        if other >= self {
            Money::zero()
        } else {
            self - other
        }
    }

    /// Floors negative values at zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        self.max(Money::zero())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders in pt-BR style: `R$ 1.234,56`.
///
/// ## Note
/// Rounds to centavos for display. Use `amount()` for the exact value.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        let reais = (abs / 100).to_string();

        let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
        for (i, ch) in reais.chars().enumerate() {
            if i > 0 && (reais.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}R$ {},{:02}", sign, grouped, abs % 100)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.amount(), dec!(10.99));
        assert_eq!(money.cents(), 1099);
    }

    #[test]
    fn test_display_pt_br() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_cents(500).to_string(), "R$ 5,00");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5,50");
        assert_eq!(Money::zero().to_string(), "R$ 0,00");
        assert_eq!(Money::from_cents(123_456_789).to_string(), "R$ 1.234.567,89");
        assert_eq!(Money::from_cents(100_000).to_string(), "R$ 1.000,00");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let exact = Money::new(dec!(32.175));
        assert_eq!(exact.round_to_cents().amount(), dec!(32.18));
        assert_eq!(exact.cents(), 3218);
        assert_eq!(Money::new(dec!(-0.005)).cents(), -1);
        assert_eq!(Money::new(dec!(0.004)).cents(), 0);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_multiply_quantity_saturates() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.multiply_quantity(2), huge);
        assert_eq!(huge * -2, Money::new(Decimal::MIN));
        assert_eq!(huge.multiply_quantity(i64::MAX), huge);
    }

    #[test]
    fn test_saturating_sub_never_negative() {
        let a = Money::from_cents(300);
        let b = Money::from_cents(500);
        assert_eq!(a.saturating_sub(b), Money::zero());
        assert_eq!(b.saturating_sub(a).cents(), 200);
        assert_eq!((a - b).non_negative(), Money::zero());
    }

    #[test]
    fn test_percent_of_keeps_fractional_cents() {
        let subtotal = Money::new(dec!(35.75));
        let ten = Percent::from_whole(10).unwrap();
        assert_eq!(subtotal.percent_of(ten).amount(), dec!(3.575));
        assert_eq!((subtotal - subtotal.percent_of(ten)).amount(), dec!(32.175));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::new(dec!(32.175))).unwrap();
        assert_eq!(json, "\"32.175\"");
    }
}
