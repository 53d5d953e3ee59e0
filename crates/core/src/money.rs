//! Monetary amounts in integer minor units.
//!
//! All money in the system is carried as whole minor units (e.g. cents) of the
//! merchant's currency. Arithmetic is integer-only, so totals never pick up
//! binary-float rounding drift. Currency conversion is out of scope; the
//! currency code lives on the merchant's shipping-fee settings.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// A non-negative amount of money in minor units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Amount in minor units.
    pub fn minor(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiply by a line-item quantity.
    pub fn times(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(u64::from(quantity)).map(Money)
    }

    /// The given whole-percent share of this amount, rounded to the nearest
    /// minor unit (half away from zero).
    pub fn percent_share(self, percent: u16) -> Option<Money> {
        let scaled = self.0.checked_mul(u64::from(percent))?;
        Some(Money((scaled + 50) / 100))
    }

    /// This amount reduced by a whole-percent share (e.g. a restocking fee).
    ///
    /// Saturates at zero for shares over 100%.
    pub fn minus_percent(self, percent: u16) -> Option<Money> {
        let share = self.percent_share(percent)?;
        Some(Money(self.0.saturating_sub(share.0)))
    }

    /// This amount increased by a whole-percent share (e.g. a store-credit bonus).
    pub fn plus_percent(self, percent: u16) -> Option<Money> {
        let share = self.percent_share(percent)?;
        self.checked_add(share)
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    /// Renders as a two-decimal figure (`1234` -> `"12.34"`).
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_decimals() {
        assert_eq!(Money::from_minor(1234).to_string(), "12.34");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn percent_share_rounds_to_nearest_minor_unit() {
        // 10% of 0.05 is 0.005 -> rounds to 0.01
        assert_eq!(Money::from_minor(5).percent_share(10), Some(Money::from_minor(1)));
        // 10% of 0.04 is 0.004 -> rounds to 0.00
        assert_eq!(Money::from_minor(4).percent_share(10), Some(Money::ZERO));
        assert_eq!(
            Money::from_minor(10_000).percent_share(15),
            Some(Money::from_minor(1_500))
        );
    }

    #[test]
    fn minus_percent_saturates_at_zero() {
        assert_eq!(
            Money::from_minor(100).minus_percent(150),
            Some(Money::ZERO)
        );
    }

    #[test]
    fn plus_percent_adds_bonus_share() {
        assert_eq!(
            Money::from_minor(2_000).plus_percent(10),
            Some(Money::from_minor(2_200))
        );
        assert_eq!(Money::from_minor(2_000).plus_percent(0), Some(Money::from_minor(2_000)));
    }

    #[test]
    fn times_scales_by_quantity() {
        assert_eq!(Money::from_minor(1_999).times(3), Some(Money::from_minor(5_997)));
        assert_eq!(Money::from_minor(u64::MAX).times(2), None);
    }
}
