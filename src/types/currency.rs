//! Currency value type
//!
//! A `Currency` describes one unit of account offered by a provider. It is
//! immutable once built: its decimal precision drives every rounding decision
//! the ledger makes, so it must never change for the lifetime of the currency.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest decimal precision a currency may declare
pub const MAX_DECIMAL_PRECISION: u32 = 28;

/// A unit of account
///
/// Built with [`Currency::new`] and the `with_*` builder methods. Equality is
/// structural; providers compare currencies by identifier through their
/// catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    identifier: String,
    symbol: String,
    display_name_singular: String,
    display_name_plural: String,
    decimal_precision: u32,
    primary: bool,
    conversion_rate: Decimal,
    starting_balance: Decimal,
}

impl Currency {
    /// Create a non-primary currency with the given identifier and precision
    ///
    /// The symbol and display names default to the identifier, the conversion
    /// rate to 1 and the starting balance to zero.
    pub fn new(identifier: impl Into<String>, decimal_precision: u32) -> Self {
        let identifier = identifier.into();
        Self {
            symbol: identifier.clone(),
            display_name_singular: identifier.clone(),
            display_name_plural: identifier.clone(),
            identifier,
            decimal_precision,
            primary: false,
            conversion_rate: Decimal::ONE,
            starting_balance: Decimal::ZERO,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_display_names(
        mut self,
        singular: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        self.display_name_singular = singular.into();
        self.display_name_plural = plural.into();
        self
    }

    /// Mark this currency as the provider's primary currency
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Value of one unit of this currency expressed in primary-currency units
    pub fn with_conversion_rate(mut self, rate: Decimal) -> Self {
        self.conversion_rate = rate;
        self
    }

    /// Balance every new account receives in this currency
    pub fn with_starting_balance(mut self, amount: Decimal) -> Self {
        self.starting_balance = amount;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn display_name_singular(&self) -> &str {
        &self.display_name_singular
    }

    pub fn display_name_plural(&self) -> &str {
        &self.display_name_plural
    }

    pub fn decimal_precision(&self) -> u32 {
        self.decimal_precision
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn conversion_rate(&self) -> Decimal {
        self.conversion_rate
    }

    pub fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    /// Round an amount to this currency's precision (round-half-up)
    ///
    /// Midpoints round away from zero, so `0.005` becomes `0.01` and
    /// `-0.005` becomes `-0.01` at two decimal places. A result that rounds to
    /// zero is normalized to an unsigned zero.
    pub fn round(&self, amount: Decimal) -> Decimal {
        let rounded = amount
            .round_dp_with_strategy(self.decimal_precision, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            Decimal::ZERO
        } else {
            rounded
        }
    }

    /// Render an amount with this currency's symbol and precision
    pub fn format(&self, amount: Decimal) -> String {
        format!(
            "{}{:.prec$}",
            self.symbol,
            self.round(amount),
            prec = self.decimal_precision as usize
        )
    }

    /// Render an amount as a plain number padded to this currency's precision
    pub fn format_plain(&self, amount: Decimal) -> String {
        format!(
            "{:.prec$}",
            self.round(amount),
            prec = self.decimal_precision as usize
        )
    }

    /// Convert an amount of this currency into `target`
    ///
    /// Both conversion rates are relative to the primary currency. Returns
    /// `None` if the arithmetic overflows or the target rate is zero.
    pub fn convert(&self, amount: Decimal, target: &Currency) -> Option<Decimal> {
        let in_primary = amount.checked_mul(self.conversion_rate)?;
        let converted = in_primary.checked_div(target.conversion_rate)?;
        Some(target.round(converted))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn dollars() -> Currency {
        Currency::new("dollars", 2)
            .with_symbol("$")
            .with_display_names("Dollar", "Dollars")
            .primary()
    }

    #[test]
    fn test_new_defaults() {
        let currency = Currency::new("tokens", 0);
        assert_eq!(currency.identifier(), "tokens");
        assert_eq!(currency.symbol(), "tokens");
        assert_eq!(currency.decimal_precision(), 0);
        assert!(!currency.is_primary());
        assert_eq!(currency.conversion_rate(), Decimal::ONE);
        assert_eq!(currency.starting_balance(), Decimal::ZERO);
    }

    #[rstest]
    #[case::half_rounds_up(dec!(0.005), dec!(0.01))]
    #[case::below_half_rounds_down(dec!(0.004), dec!(0.00))]
    #[case::negative_half_rounds_away(dec!(-0.005), dec!(-0.01))]
    #[case::exact_value_untouched(dec!(12.34), dec!(12.34))]
    #[case::long_tail(dec!(10.125), dec!(10.13))]
    fn test_round_half_up(#[case] amount: Decimal, #[case] expected: Decimal) {
        assert_eq!(dollars().round(amount), expected);
    }

    #[test]
    fn test_round_normalizes_negative_zero() {
        let rounded = dollars().round(dec!(-0.001));
        assert_eq!(rounded, Decimal::ZERO);
        assert!(!rounded.is_sign_negative());
    }

    #[rstest]
    #[case(dec!(12.5), "$12.50")]
    #[case(dec!(0), "$0.00")]
    #[case(dec!(3.14159), "$3.14")]
    fn test_format(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(dollars().format(amount), expected);
    }

    #[test]
    fn test_format_plain_zero_precision() {
        let tokens = Currency::new("tokens", 0);
        assert_eq!(tokens.format_plain(dec!(2.5)), "3");
        assert_eq!(tokens.format_plain(dec!(7)), "7");
    }

    #[test]
    fn test_convert_through_primary_rate() {
        let gems = Currency::new("gems", 0).with_conversion_rate(dec!(25));
        let dollars = dollars();

        assert_eq!(gems.convert(dec!(3), &dollars), Some(dec!(75.00)));
        assert_eq!(dollars.convert(dec!(60), &gems), Some(dec!(2)));
    }

    #[test]
    fn test_convert_to_zero_rate_is_none() {
        let broken = Currency::new("broken", 2).with_conversion_rate(Decimal::ZERO);
        assert_eq!(dollars().convert(dec!(1), &broken), None);
    }
}
