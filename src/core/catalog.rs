//! Currency catalog for a provider
//!
//! The catalog is built once when a provider is constructed and never changes
//! afterwards. Construction enforces the currency invariants: unique
//! identifiers under the provider's lookup policy, exactly one primary
//! currency, precision within the decimal range, positive conversion rates and
//! non-negative starting balances.

use crate::config::CurrencyLookup;
use crate::types::{Currency, EconomyError, MAX_DECIMAL_PRECISION};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Validated, immutable set of currencies
#[derive(Debug, Clone)]
pub struct CurrencyCatalog {
    /// Currencies in declaration order
    currencies: Vec<Currency>,
    /// Lookup key (per policy) to index in `currencies`
    index: HashMap<String, usize>,
    /// Index of the primary currency
    primary: usize,
    lookup: CurrencyLookup,
}

impl CurrencyCatalog {
    /// Build a catalog, rejecting any definition that breaks the invariants
    pub fn new(currencies: Vec<Currency>, lookup: CurrencyLookup) -> Result<Self, EconomyError> {
        let mut index = HashMap::with_capacity(currencies.len());

        for (position, currency) in currencies.iter().enumerate() {
            validate(currency)?;
            if index
                .insert(lookup.key(currency.identifier()), position)
                .is_some()
            {
                return Err(EconomyError::duplicate_currency(currency.identifier()));
            }
        }

        let primaries: Vec<usize> = currencies
            .iter()
            .enumerate()
            .filter(|(_, currency)| currency.is_primary())
            .map(|(position, _)| position)
            .collect();
        let primary = match primaries.as_slice() {
            [only] => *only,
            other => return Err(EconomyError::PrimaryCurrency { count: other.len() }),
        };

        Ok(Self {
            currencies,
            index,
            primary,
            lookup,
        })
    }

    pub fn primary(&self) -> &Currency {
        &self.currencies[self.primary]
    }

    /// All currencies in declaration order
    pub fn all(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn lookup(&self) -> CurrencyLookup {
        self.lookup
    }

    /// Find a currency by identifier under this catalog's lookup policy
    pub fn find(&self, identifier: &str) -> Option<&Currency> {
        self.index
            .get(&self.lookup.key(identifier))
            .map(|&position| &self.currencies[position])
    }

    /// Map a consumer-supplied currency onto the catalog's own definition
    ///
    /// The catalog entry is authoritative: a caller holding a stale or
    /// hand-built `Currency` still gets the provider's precision.
    pub fn resolve(&self, currency: &Currency) -> Result<&Currency, EconomyError> {
        self.find(currency.identifier())
            .ok_or_else(|| EconomyError::unknown_currency(currency.identifier()))
    }
}

fn validate(currency: &Currency) -> Result<(), EconomyError> {
    if currency.decimal_precision() > MAX_DECIMAL_PRECISION {
        return Err(EconomyError::invalid_currency(
            currency.identifier(),
            &format!(
                "precision {} exceeds {}",
                currency.decimal_precision(),
                MAX_DECIMAL_PRECISION
            ),
        ));
    }
    if currency.conversion_rate() <= Decimal::ZERO {
        return Err(EconomyError::invalid_currency(
            currency.identifier(),
            "conversion rate must be positive",
        ));
    }
    if currency.starting_balance() < Decimal::ZERO {
        return Err(EconomyError::invalid_currency(
            currency.identifier(),
            "starting balance must not be negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn dollars() -> Currency {
        Currency::new("dollars", 2).primary()
    }

    fn tokens() -> Currency {
        Currency::new("tokens", 0)
    }

    #[test]
    fn test_new_accepts_valid_catalog() {
        let catalog = CurrencyCatalog::new(vec![dollars(), tokens()], CurrencyLookup::Exact).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.primary().identifier(), "dollars");
        assert_eq!(catalog.all()[1].identifier(), "tokens");
    }

    #[rstest]
    #[case::exact(CurrencyLookup::Exact, vec![dollars(), Currency::new("dollars", 0)])]
    #[case::case_insensitive(CurrencyLookup::CaseInsensitive, vec![dollars(), Currency::new("DOLLARS", 0)])]
    fn test_new_rejects_duplicates(#[case] lookup: CurrencyLookup, #[case] currencies: Vec<Currency>) {
        let result = CurrencyCatalog::new(currencies, lookup);
        assert!(matches!(result, Err(EconomyError::DuplicateCurrency { .. })));
    }

    #[test]
    fn test_exact_lookup_allows_case_variants() {
        let currencies = vec![dollars(), Currency::new("DOLLARS", 0)];
        assert!(CurrencyCatalog::new(currencies, CurrencyLookup::Exact).is_ok());
    }

    #[rstest]
    #[case::no_primary(vec![tokens()], 0)]
    #[case::two_primaries(vec![dollars(), tokens().primary()], 2)]
    #[case::empty(vec![], 0)]
    fn test_new_requires_exactly_one_primary(
        #[case] currencies: Vec<Currency>,
        #[case] count: usize,
    ) {
        let result = CurrencyCatalog::new(currencies, CurrencyLookup::Exact);
        assert_eq!(result.unwrap_err(), EconomyError::PrimaryCurrency { count });
    }

    #[rstest]
    #[case::precision(Currency::new("gems", 29).primary())]
    #[case::zero_rate(Currency::new("gems", 2).primary().with_conversion_rate(dec!(0)))]
    #[case::negative_start(Currency::new("gems", 2).primary().with_starting_balance(dec!(-1)))]
    fn test_new_rejects_invalid_currency(#[case] currency: Currency) {
        let result = CurrencyCatalog::new(vec![currency], CurrencyLookup::Exact);
        assert!(matches!(result, Err(EconomyError::InvalidCurrency { .. })));
    }

    #[rstest]
    #[case::exact_hit(CurrencyLookup::Exact, "dollars", true)]
    #[case::exact_miss(CurrencyLookup::Exact, "Dollars", false)]
    #[case::insensitive_hit(CurrencyLookup::CaseInsensitive, "DOLLARS", true)]
    #[case::unknown(CurrencyLookup::CaseInsensitive, "euros", false)]
    fn test_find(#[case] lookup: CurrencyLookup, #[case] identifier: &str, #[case] found: bool) {
        let catalog = CurrencyCatalog::new(vec![dollars(), tokens()], lookup).unwrap();
        assert_eq!(catalog.find(identifier).is_some(), found);
    }

    #[test]
    fn test_resolve_returns_catalog_definition() {
        let catalog = CurrencyCatalog::new(vec![dollars(), tokens()], CurrencyLookup::Exact).unwrap();
        let forged = Currency::new("dollars", 8);
        assert_eq!(catalog.resolve(&forged).unwrap().decimal_precision(), 2);
    }

    #[test]
    fn test_resolve_unknown_currency() {
        let catalog = CurrencyCatalog::new(vec![dollars()], CurrencyLookup::Exact).unwrap();
        let result = catalog.resolve(&Currency::new("euros", 2));
        assert_eq!(result.unwrap_err(), EconomyError::unknown_currency("euros"));
    }
}
