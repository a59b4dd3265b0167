//! Money type for representing monetary values.
//!
//! Uses cents-based integer representation to avoid floating-point
//! precision issues. Prices arriving from the store as decimal text are
//! parsed with `rust_decimal` and never pass through `f64`.

use rust_decimal::prelude::{Decimal, RoundingStrategy, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CartError;

/// Minor units per major unit. Every supported currency has two decimals.
const MINOR_PER_MAJOR: i64 = 100;

/// Decimal places kept when parsing store prices.
const DECIMAL_PLACES: u32 = 2;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    /// Kenyan shilling, the storefront's home currency.
    #[default]
    KES,
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::KES => "KES",
        }
    }

    /// Get the currency symbol (e.g., "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::KES => "Ksh ",
        }
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "KES" | "KSH" => Some(Currency::KES),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
///
/// Amounts are stored in the smallest unit of the currency (e.g., cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_cents: i64,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from cents.
    pub fn new(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Parse a decimal amount such as `"49.99"`, `"1200"` or `"0.125"`.
    ///
    /// Digits past the second decimal place round half away from zero.
    ///
    /// ```
    /// use turbo_cart::money::{Currency, Money};
    /// let price = Money::parse_decimal("49.99", Currency::USD).unwrap();
    /// assert_eq!(price.amount_cents, 4999);
    /// ```
    pub fn parse_decimal(text: &str, currency: Currency) -> Result<Self, CartError> {
        let amount = Decimal::from_str(text.trim())
            .map_err(|_| CartError::InvalidPrice(text.to_string()))?;

        amount
            .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))
            .and_then(|minor| minor.to_i64())
            .map(|cents| Self::new(cents, currency))
            .ok_or(CartError::Overflow)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount_cents < 0
    }

    /// Format as a display string (e.g., "$49.99").
    pub fn display(&self) -> String {
        if self.is_negative() {
            format!("-{}{}", self.currency.symbol(), self.abs_amount())
        } else {
            format!("{}{}", self.currency.symbol(), self.abs_amount())
        }
    }

    /// Format as a fixed two-decimal string without symbol (e.g., "49.99").
    pub fn display_amount(&self) -> String {
        if self.is_negative() {
            format!("-{}", self.abs_amount())
        } else {
            self.abs_amount()
        }
    }

    fn abs_amount(&self) -> String {
        let abs = self.amount_cents.unsigned_abs();
        let per_major = MINOR_PER_MAJOR as u64;
        format!("{}.{:02}", abs / per_major, abs % per_major)
    }

    /// Try to add another Money value, returning None on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_cents
            .checked_add(other.amount_cents)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Multiply by a quantity, returning None on overflow.
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        self.amount_cents
            .checked_mul(factor)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Sum an iterator of Money values, returning None on mismatch or overflow.
    pub fn try_sum<'a>(
        mut iter: impl Iterator<Item = &'a Money>,
        currency: Currency,
    ) -> Option<Money> {
        iter.try_fold(Money::zero(currency), |acc, m| acc.try_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let m = Money::new(4999, Currency::USD);
        assert_eq!(m.amount_cents, 4999);
        assert_eq!(m.currency, Currency::USD);
    }

    #[test]
    fn test_parse_decimal() {
        let parse = |s| Money::parse_decimal(s, Currency::KES).unwrap().amount_cents;
        assert_eq!(parse("49.99"), 4999);
        assert_eq!(parse("1200"), 120_000);
        assert_eq!(parse("0.5"), 50);
        assert_eq!(parse(" 3.10 "), 310);
    }

    #[test]
    fn test_parse_decimal_rounds_half_away_from_zero() {
        let parse = |s| Money::parse_decimal(s, Currency::KES).unwrap().amount_cents;
        assert_eq!(parse("0.125"), 13);
        assert_eq!(parse("0.124"), 12);
        assert_eq!(parse("-0.125"), -13);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        for bad in ["", "abc", "1.2.3", "1e5", "12,50"] {
            assert!(
                Money::parse_decimal(bad, Currency::USD).is_err(),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(4999, Currency::USD).display(), "$49.99");
        assert_eq!(Money::new(120_000, Currency::KES).display(), "Ksh 1200.00");
        assert_eq!(Money::new(-5, Currency::USD).display(), "-$0.05");
        assert_eq!(Money::new(700, Currency::USD).display_amount(), "7.00");
    }

    #[test]
    fn test_money_addition() {
        let a = Money::new(1000, Currency::USD);
        let b = Money::new(500, Currency::USD);
        assert_eq!(a.try_add(&b).unwrap().amount_cents, 1500);
    }

    #[test]
    fn test_money_currency_mismatch() {
        let usd = Money::new(1000, Currency::USD);
        let eur = Money::new(1000, Currency::EUR);
        assert!(usd.try_add(&eur).is_none());
    }

    #[test]
    fn test_money_multiply_overflow() {
        let m = Money::new(i64::MAX, Currency::USD);
        assert!(m.try_multiply(2).is_none());
        assert_eq!(
            Money::new(250, Currency::USD).try_multiply(3).unwrap().amount_cents,
            750
        );
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::USD));
        assert_eq!(Currency::from_code("ksh"), Some(Currency::KES));
        assert_eq!(Currency::from_code("INVALID"), None);
    }
}
