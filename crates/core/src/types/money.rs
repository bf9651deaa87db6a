//! Monetary amounts using decimal arithmetic.
//!
//! The backend exchanges amounts as decimal strings (`"1500.00"`). `Money`
//! keeps them as `Decimal` so credit totals never pass through floats.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("amount must be a number")]
    NotANumber,
    /// The amount is zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The amount has more than two decimal places.
    #[error("amount can have at most two decimal places")]
    TooPrecise,
}

/// A non-negative amount in the company's operating currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a strictly positive amount as typed into a form.
    ///
    /// Thousands separators (`,`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not numeric, not positive,
    /// or carries more than two decimal places.
    pub fn parse_positive(input: &str) -> Result<Self, MoneyError> {
        let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(MoneyError::Empty);
        }

        let amount = Decimal::from_str(&cleaned).map_err(|_| MoneyError::NotANumber)?;
        if amount <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }
        if amount.normalize().scale() > 2 {
            return Err(MoneyError::TooPrecise);
        }

        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round half-up to cents.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_accepts_separators() {
        let money = Money::parse_positive(" 12,500.50 ").unwrap();
        assert_eq!(money.amount(), Decimal::new(1_250_050, 2));
    }

    #[test]
    fn test_parse_positive_rejects_bad_input() {
        assert_eq!(Money::parse_positive(""), Err(MoneyError::Empty));
        assert_eq!(Money::parse_positive("abc"), Err(MoneyError::NotANumber));
        assert_eq!(Money::parse_positive("0"), Err(MoneyError::NotPositive));
        assert_eq!(Money::parse_positive("-5"), Err(MoneyError::NotPositive));
        assert_eq!(Money::parse_positive("1.234"), Err(MoneyError::TooPrecise));
    }

    #[test]
    fn test_trailing_zeros_are_not_too_precise() {
        assert!(Money::parse_positive("10.5000").is_ok());
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::new(Decimal::new(15, 0)).to_string(), "15.00");
    }

    #[test]
    fn test_deserializes_backend_decimal_string() {
        let money: Money = serde_json::from_str("\"1500.00\"").unwrap();
        assert_eq!(money.amount(), Decimal::new(150_000, 2));
    }

    #[test]
    fn test_round_cents() {
        let money = Money::new(Decimal::new(33_335, 3)).round_cents();
        assert_eq!(money.to_string(), "33.34");
    }
}
