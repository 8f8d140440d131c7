//! Monetary amounts.
//!
//! `Money` is a value object: no identity, compared by value, immutable.
//! It wraps a fixed-precision decimal so sums over many invoices never drift
//! the way binary floating point does. No currency is attached; the whole
//! application works in a single (local) currency.
//!
//! On the wire `Money` is a plain JSON number (`200`, `12.5`) so that backup
//! files stay compatible with numeric amounts written by other tools. Amounts
//! a JSON number cannot carry exactly (more digits than an `f64` holds) are
//! written as numeric strings (`"0.1234567890123456789"`), which are accepted
//! on input as well.
//!
//! The arithmetic operators saturate at the edge of the decimal range rather
//! than panic. Invoice totals use the `checked_*` forms so an out-of-range
//! amount is rejected instead of clamped.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A monetary amount in the application currency.
///
/// Negative amounts are representable; nothing in the domain rejects them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole units (no fractional part).
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// `minor / 100`, e.g. `from_minor(1250)` is `12.50`.
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self * quantity`, saturating.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// `self * quantity`, `None` on overflow.
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Lossy conversion for consumers that only speak `f64` (spreadsheets).
    pub fn to_f64(&self) -> f64 {
        self.0.normalize().to_string().parse().unwrap_or(0.0)
    }

    /// Fixed two-decimal rendering used on printed documents.
    pub fn to_display_2dp(&self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map(Self)
            .map_err(|e| DomainError::validation(format!("invalid amount {s:?}: {e}")))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<u32> for Money {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let normalized = self.0.normalize();
        if normalized.fract().is_zero() {
            if let Some(units) = normalized.to_i64() {
                return serializer.serialize_i64(units);
            }
        }
        match exact_f64(normalized) {
            Some(as_float) => serializer.serialize_f64(as_float),
            None => serializer.serialize_str(&normalized.to_string()),
        }
    }
}

/// The `f64` whose shortest text is exactly `amount`, if there is one.
/// Going through the decimal text keeps the float correctly rounded, so the
/// JSON writer emits the same digits back.
fn exact_f64(amount: Decimal) -> Option<f64> {
    let as_float: f64 = amount.to_string().parse().ok()?;
    let back = Decimal::from_str(&as_float.to_string()).ok()?;
    (back == amount).then_some(as_float)
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        // `f64`'s Display is the shortest text that round-trips, i.e. the
        // digits that were written in the JSON document.
        v.to_string().parse::<Money>().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse::<Money>().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn integers_serialize_without_fraction() {
        assert_eq!(serde_json::to_string(&Money::from_units(200)).unwrap(), "200");
        assert_eq!(serde_json::to_string(&Money::from_minor(20000)).unwrap(), "200");
    }

    #[test]
    fn fractions_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&Money::from_minor(1250)).unwrap(), "12.5");
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let a: Money = serde_json::from_str("0.1").unwrap();
        let b: Money = serde_json::from_str("\"0.10\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Money::from_minor(10));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Money>("true").is_err());
    }

    #[test]
    fn decimal_sums_do_not_drift() {
        let total: Money = std::iter::repeat(Money::from_minor(10)).take(10).sum();
        assert_eq!(total, Money::from_units(1));
    }

    #[test]
    fn two_decimal_display() {
        assert_eq!(Money::from_minor(1250).to_display_2dp(), "12.50");
        assert_eq!(Money::from_units(7).to_display_2dp(), "7.00");
        assert_eq!(Money::from_minor(1250).to_string(), "12.5");
    }

    #[test]
    fn long_fractions_are_written_as_exact_strings() {
        let m: Money = "0.1234567890123456789".parse().unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"0.1234567890123456789\"");
        assert_eq!(serde_json::from_str::<Money>(&json).unwrap(), m);
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max.checked_times(2), None);
        assert_eq!(max.checked_add(Money::from_units(1)), None);
        assert_eq!(Money::from_units(3).checked_times(2), Some(Money::from_units(6)));
    }

    #[test]
    fn operators_saturate_instead_of_panicking() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max.times(2), max);
        assert_eq!(max + max, max);
        assert_eq!(-max - max, -max);
    }

    proptest! {
        #[test]
        fn json_roundtrip_is_exact_at_any_scale(mantissa in any::<i64>(), scale in 0u32..=28) {
            let m = Money::new(Decimal::new(mantissa, scale));
            let json = serde_json::to_string(&m).unwrap();
            let back: Money = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, m);
        }

        #[test]
        fn json_roundtrip_preserves_cent_amounts(minor in -1_000_000_000i64..1_000_000_000i64) {
            let m = Money::from_minor(minor);
            let json = serde_json::to_string(&m).unwrap();
            let back: Money = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, m);
        }
    }
}
