use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "EUR";

/// Tolerance applied before flooring a payout, so that decimal odds such as `2.3` that have no exact binary
/// representation do not lose a minor unit (`100 * 2.3 == 229.99999999999997`).
const PAYOUT_EPSILON: f64 = 1e-7;

//--------------------------------------        Money         ---------------------------------------------------------
/// An amount of money, stored as an integer number of minor currency units (e.g. cents).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies the amount by decimal odds and rounds down to the nearest minor unit.
    ///
    /// Non-finite or negative odds yield an error rather than a silently wrong payout.
    pub fn multiply_odds(&self, odds: f64) -> Result<Self, MoneyConversionError> {
        if !odds.is_finite() || odds < 0.0 {
            return Err(MoneyConversionError(format!("Invalid odds: {odds}")));
        }
        let product = (self.0 as f64 * odds + PAYOUT_EPSILON).floor();
        if product > i64::MAX as f64 || product < i64::MIN as f64 {
            return Err(MoneyConversionError(format!("{} x {odds} overflows", self.0)));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(product as i64))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Money::from(123_456).to_string(), "1234.56");
        assert_eq!(Money::from(5).to_string(), "0.05");
        assert_eq!(Money::from(-250).to_string(), "-2.50");
    }

    #[test]
    fn payouts_round_down() {
        assert_eq!(Money::from(1000).multiply_odds(1.85).unwrap(), Money::from(1850));
        assert_eq!(Money::from(100).multiply_odds(2.3).unwrap(), Money::from(230));
        assert_eq!(Money::from(999).multiply_odds(1.5).unwrap(), Money::from(1498));
        assert_eq!(Money::from(0).multiply_odds(4.0).unwrap(), Money::from(0));
    }

    #[test]
    fn bad_odds_are_rejected() {
        assert!(Money::from(100).multiply_odds(f64::NAN).is_err());
        assert!(Money::from(100).multiply_odds(-1.0).is_err());
        assert!(Money::from(i64::MAX).multiply_odds(10.0).is_err());
    }

    #[test]
    fn arithmetic() {
        let total: Money = vec![Money::from(100), Money::from(250), -Money::from(50)].into_iter().sum();
        assert_eq!(total, Money::from(300));
        let mut m = Money::from_major(3);
        m -= Money::from(1);
        m += Money::from(2);
        assert_eq!(m.value(), 301);
    }

    #[test]
    fn serde_is_transparent_number() {
        let m: Money = serde_json::from_str("1250").unwrap();
        assert_eq!(m, Money::from(1250));
    }
}
