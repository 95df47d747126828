//! # Quantity Module
//!
//! Provides the `Quantity` type for product quantities on quants, moves and
//! move lines.
//!
//! ## Why Fixed-Point Quantities?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing float quants:                                                  │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │    "qty_available = 0.3" → no match  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer thousandths of a unit                           │
//! │    100 + 200 = 300 milli-units                                         │
//! │    SUM() in SQLite is exact, `=` comparisons are exact                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stock_core::quantity::Quantity;
//!
//! let on_hand = Quantity::from_units(500);
//! let reserved: Quantity = "120.5".parse().unwrap();
//!
//! assert_eq!((on_hand - reserved).to_string(), "379.500");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Number of stored sub-units per unit (three decimals of precision).
pub const MILLI_PER_UNIT: i64 = 1000;

// =============================================================================
// Quantity Type
// =============================================================================

/// A product quantity stored as thousandths of a unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: quants can go negative when stock is over-consumed
/// - **Single field tuple struct**: stored as INTEGER, summed exactly in SQL
/// - **Range**: about ±9.2e15 units. `+`/`-` follow `i64` overflow rules;
///   use `checked_add`/`checked_sub` where operands are unbounded
///
/// ## Where Quantity Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Quant.quantity ──► eligible_quants() ──► reserve() ──► MoveLine.qty   │
/// │        │                                                                │
/// │        └──► qty_available() / SQL SUM ──► QtyComparison                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from thousandths of a unit.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a quantity from whole units.
    ///
    /// ## Range
    /// Valid for `|units| <= i64::MAX / 1000` (about 9.2e15 units); larger
    /// values overflow. Use [`checked_from_units`](Self::checked_from_units)
    /// for untrusted input.
    ///
    /// ## Example
    /// ```rust
    /// use stock_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(500).milli(), 500_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    /// Like [`from_units`](Self::from_units), `None` when out of range.
    #[inline]
    pub const fn checked_from_units(units: i64) -> Option<Self> {
        match units.checked_mul(MILLI_PER_UNIT) {
            Some(milli) => Some(Quantity(milli)),
            None => None,
        }
    }

    /// Addition returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Quantity)
    }

    /// Subtraction returning `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Quantity)
    }

    /// Returns the raw value in thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
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

    /// Subtraction clamped at zero.
    ///
    /// Used for "what is still free on this quant" where an over-reserved
    /// quant must read as empty rather than negative.
    #[inline]
    pub fn saturating_sub_to_zero(self, other: Self) -> Self {
        if self.0 > other.0 {
            Quantity(self.0 - other.0)
        } else {
            Quantity(0)
        }
    }

    /// Approximate value for display and reporting only.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MILLI_PER_UNIT as f64
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses decimal strings such as `"500"`, `"500.00"` or `"-0.125"`.
///
/// More than three decimals is rejected rather than silently rounded.
impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "quantity".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }
        if frac.len() > 3 {
            return Err(invalid("at most 3 decimals are supported"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("out of range"))?
        };
        let mut frac_milli: i64 = 0;
        for (i, c) in frac.chars().enumerate() {
            let digit = i64::from(c as u8 - b'0');
            frac_milli += digit * 10_i64.pow(2 - i as u32);
        }

        let milli = whole
            .checked_mul(MILLI_PER_UNIT)
            .and_then(|w| w.checked_add(frac_milli))
            .ok_or_else(|| invalid("out of range"))?;

        Ok(Quantity(if negative { -milli } else { milli }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_unit = MILLI_PER_UNIT as u64;
        write!(f, "{}{}.{:03}", sign, abs / per_unit, abs % per_unit)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Quantity> for Quantity {
    fn sum<I: Iterator<Item = &'a Quantity>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let qty = Quantity::from_units(500);
        assert_eq!(qty.milli(), 500_000);
        assert_eq!(qty.to_string(), "500.000");
    }

    #[test]
    fn test_parse() {
        assert_eq!("500".parse::<Quantity>().unwrap(), Quantity::from_units(500));
        assert_eq!("500.00".parse::<Quantity>().unwrap(), Quantity::from_units(500));
        assert_eq!("0.125".parse::<Quantity>().unwrap().milli(), 125);
        assert_eq!("-1.5".parse::<Quantity>().unwrap().milli(), -1500);
        assert_eq!(".5".parse::<Quantity>().unwrap().milli(), 500);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Quantity>().is_err());
        assert!("abc".parse::<Quantity>().is_err());
        assert!("1.2345".parse::<Quantity>().is_err());
        assert!("1.2.3".parse::<Quantity>().is_err());
        assert!("-".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Quantity::from_milli(-1500).to_string(), "-1.500");
        assert_eq!(Quantity::from_milli(-5).to_string(), "-0.005");
    }

    #[test]
    fn test_sum_is_exact() {
        // 0.1 + 0.2 == 0.3 with no drift
        let parts = ["0.1", "0.2"].map(|s| s.parse::<Quantity>().unwrap());
        let total: Quantity = parts.iter().sum();
        assert_eq!(total, "0.3".parse().unwrap());
    }

    #[test]
    fn test_checked_arithmetic_at_the_limits() {
        assert_eq!(Quantity::checked_from_units(2), Some(Quantity::from_milli(2000)));
        assert_eq!(Quantity::checked_from_units(i64::MAX), None);
        assert_eq!(Quantity::checked_from_units(i64::MIN / 1000 - 1), None);

        let max = Quantity::from_milli(i64::MAX);
        assert_eq!(max.checked_add(Quantity::from_milli(1)), None);
        assert_eq!(
            Quantity::from_milli(i64::MIN).checked_sub(Quantity::from_milli(1)),
            None
        );
        assert_eq!(
            Quantity::from_units(3).checked_sub(Quantity::from_units(5)),
            Some(Quantity::from_units(-2))
        );
    }

    #[test]
    fn test_saturating_sub_to_zero() {
        let a = Quantity::from_units(3);
        let b = Quantity::from_units(5);
        assert_eq!(a.saturating_sub_to_zero(b), Quantity::zero());
        assert_eq!(b.saturating_sub_to_zero(a), Quantity::from_units(2));
    }
}
