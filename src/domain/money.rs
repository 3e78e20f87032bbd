use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// A non-negative monetary value in MAD (Moroccan Dirham).
///
/// Wraps `rust_decimal::Decimal` to keep all monetary arithmetic exact across
/// repeated increments. Balances may never go below zero, so subtraction is
/// only exposed through [`Money::checked_sub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(Error::Validation(
                "monetary value must not be negative".to_string(),
            ))
        }
    }

    /// Whole-dirham constructor for the tariff tables.
    pub fn from_mad(value: u32) -> Self {
        Self(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        if self.0 >= rhs.0 {
            Ok(Self(self.0 - rhs.0))
        } else {
            Err(Error::Validation("insufficient balance".to_string()))
        }
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A strictly positive amount, used for wallet top-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Credit(Decimal);

impl Credit {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(Error::Validation(
                "credit amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Credit {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Credit> for Money {
    fn from(credit: Credit) -> Self {
        Self(credit.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let mut total = Money::from_mad(15);
        total += Money::from_mad(14);
        assert_eq!(total, Money::from_mad(29));
        assert_eq!(Money::from_mad(20) + Money::from_mad(5), Money::from_mad(25));
    }

    #[test]
    fn test_money_rejects_negative() {
        assert!(Money::new(dec!(-1.0)).is_err());
        assert!(Money::new(dec!(0.0)).is_ok());
    }

    #[test]
    fn test_checked_sub_guards_balance() {
        let balance = Money::from_mad(10);
        assert_eq!(
            balance.checked_sub(Money::from_mad(4)).unwrap(),
            Money::from_mad(6)
        );
        assert!(balance.checked_sub(Money::from_mad(11)).is_err());
    }

    #[test]
    fn test_credit_must_be_positive() {
        assert!(Credit::new(dec!(50)).is_ok());
        assert!(matches!(Credit::new(dec!(0)), Err(Error::Validation(_))));
        assert!(matches!(Credit::new(dec!(-5)), Err(Error::Validation(_))));
    }
}
