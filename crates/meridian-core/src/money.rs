//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Inclusive tax extraction makes it worse:                               │
//! │    110.00 * 0.10 / 1.10 = 9.999999999999998                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + explicit rounding                  │
//! │    11000 * 1000 / 11000 = 1000 cents, rounded by a named rule           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use meridian_core::money::{Money, RoundingMode};
//! use meridian_core::types::TaxRate;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price.multiply_quantity(3); // 32.97
//! let tax = line.exclusive_tax(TaxRate::from_bps(1000), RoundingMode::HalfUp);
//! assert_eq!(tax.cents(), 330);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in 100%.
pub const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Rounding
// =============================================================================

/// How fractional minor units are resolved.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────┐
/// │  value   │  HalfUp (away from zero)  │  HalfEven (bankers)          │
/// │  ─────   │  ───────────────────────  │  ──────────────────          │
/// │   0.5    │           1               │           0                  │
/// │   1.5    │           2               │           2                  │
/// │   2.5    │           3               │           2                  │
/// │  -2.5    │          -3               │          -2                  │
/// └─────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round half away from zero. Matches most retail receipts.
    #[default]
    HalfUp,
    /// Round half to even. Removes the upward bias over many transactions.
    HalfEven,
}

impl std::str::FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "half_up" | "halfup" | "up" => Ok(RoundingMode::HalfUp),
            "half_even" | "halfeven" | "even" | "bankers" => Ok(RoundingMode::HalfEven),
            other => Err(format!("unknown rounding mode '{}'", other)),
        }
    }
}

/// Divides `num` by a positive `den`, rounding the remainder with `mode`.
pub fn div_round(num: i128, den: i128, mode: RoundingMode) -> i128 {
    debug_assert!(den > 0, "denominator must be positive");

    let quotient = num.div_euclid(den);
    let twice_remainder = num.rem_euclid(den) * 2;

    match twice_remainder.cmp(&den) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => match mode {
            // div_euclid floors, so for negatives the floor is already away from zero
            RoundingMode::HalfUp if num < 0 => quotient,
            RoundingMode::HalfUp => quotient + 1,
            RoundingMode::HalfEven if quotient % 2 == 0 => quotient,
            RoundingMode::HalfEven => quotient + 1,
        },
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: refunds and change calculations may go negative
/// - **Single field tuple struct**: serializes as a bare integer on the wire
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► OrderLineItem.unit_price ──► line gross/net/tax      │
/// │                                                                         │
/// │  Σ lines ──► BillingSummary.sub_total ──► promotions ──► grand_total    │
/// │                                                                         │
/// │  PaymentDetail.amount ──► amount_paid / balance_due / change_due        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use meridian_core::money::Money;
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

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
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
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, factor: i64) -> Option<Money> {
        match self.0.checked_mul(factor) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `bps` basis points of this amount.
    ///
    /// ```rust
    /// use meridian_core::money::{Money, RoundingMode};
    ///
    /// let subtotal = Money::from_cents(20000);
    /// assert_eq!(subtotal.percentage(1000, RoundingMode::HalfUp).cents(), 2000);
    /// ```
    pub fn percentage(&self, bps: u32, mode: RoundingMode) -> Money {
        Money(div_round(self.0 as i128 * bps as i128, BPS_SCALE, mode) as i64)
    }

    /// Tax added on top of this (tax-exclusive) amount: `amount * rate`.
    pub fn exclusive_tax(&self, rate: TaxRate, mode: RoundingMode) -> Money {
        self.percentage(rate.bps(), mode)
    }

    /// Tax already contained in this (tax-inclusive) amount:
    /// `amount * rate / (1 + rate)`.
    ///
    /// ```rust
    /// use meridian_core::money::{Money, RoundingMode};
    /// use meridian_core::types::TaxRate;
    ///
    /// // 110.00 including 10% tax contains 10.00 of tax
    /// let gross = Money::from_cents(11000);
    /// let tax = gross.inclusive_tax(TaxRate::from_bps(1000), RoundingMode::HalfUp);
    /// assert_eq!(tax.cents(), 1000);
    /// ```
    pub fn inclusive_tax(&self, rate: TaxRate, mode: RoundingMode) -> Money {
        let bps = rate.bps() as i128;
        Money(div_round(self.0 as i128 * bps, BPS_SCALE + bps, mode) as i64)
    }

    /// Clamps the value into `[Money::zero(), ceiling]`.
    ///
    /// A negative ceiling clamps to zero.
    pub fn clamp_to(&self, ceiling: Money) -> Money {
        Money(self.0.min(ceiling.0).max(0))
    }

    /// Subtraction that never goes below zero.
    #[inline]
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Operators saturate instead of overflowing. Inputs are bounded by
// MAX_MONEY_CENTS, so saturation is never reached by a valid order.

/// Plain decimal rendering for logs. Currency symbols are the register's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

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
        self.0 = self.0.saturating_add(other.0);
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
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
