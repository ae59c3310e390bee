//! Provider and replay configuration
//!
//! Configuration values are plain structs with sensible defaults. Invalid
//! values passed to the constructors are replaced by their defaults with a
//! warning rather than rejected, so a bad flag never stops a replay.

use crate::types::{Currency, FeatureSet, OptionalEconomyApiFeature};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How a provider matches currency identifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurrencyLookup {
    /// Identifiers must match byte for byte
    #[default]
    Exact,
    /// Identifiers match ignoring ASCII case
    CaseInsensitive,
}

impl CurrencyLookup {
    /// Normalize an identifier into the key used for lookups
    pub fn key(&self, identifier: &str) -> String {
        match self {
            Self::Exact => identifier.to_string(),
            Self::CaseInsensitive => identifier.to_ascii_lowercase(),
        }
    }
}

/// Configuration for the in-memory reference provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Advertise and honour `NEGATIVE_BALANCES`
    pub negative_balances: bool,
    /// Advertise `TRANSACTION_EVENTS` and publish events
    pub transaction_events: bool,
    /// Currency identifier matching policy
    pub currency_lookup: CurrencyLookup,
    /// Buffer size of the transaction event channel
    pub event_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            negative_balances: false,
            transaction_events: false,
            currency_lookup: CurrencyLookup::Exact,
            event_capacity: 256,
        }
    }
}

impl ProviderConfig {
    /// Create a ProviderConfig with custom values
    pub fn new(
        negative_balances: bool,
        transaction_events: bool,
        currency_lookup: CurrencyLookup,
        event_capacity: usize,
    ) -> Self {
        let default = Self::default();

        let event_capacity = if event_capacity == 0 {
            warn!(
                event_capacity,
                fallback = default.event_capacity,
                "invalid event capacity, using default"
            );
            default.event_capacity
        } else {
            event_capacity
        };

        Self {
            negative_balances,
            transaction_events,
            currency_lookup,
            event_capacity,
        }
    }

    /// The feature set this configuration advertises
    pub fn features(&self) -> FeatureSet {
        let mut features = FeatureSet::new();
        if self.negative_balances {
            features.insert(OptionalEconomyApiFeature::NegativeBalances);
        }
        if self.transaction_events {
            features.insert(OptionalEconomyApiFeature::TransactionEvents);
        }
        features
    }
}

/// Configuration for a journal replay
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Provider the journal is replayed against
    pub provider: ProviderConfig,
    /// Currencies offered by the provider; exactly one must be primary
    pub currencies: Vec<Currency>,
    /// Number of runtime worker threads
    pub max_concurrent: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            currencies: default_currencies(),
            max_concurrent: num_cpus::get(),
        }
    }
}

impl ReplayConfig {
    /// Create a ReplayConfig with custom values
    ///
    /// An empty currency list falls back to [`default_currencies`] and a zero
    /// worker count to the number of CPU cores.
    pub fn new(provider: ProviderConfig, currencies: Vec<Currency>, max_concurrent: usize) -> Self {
        let default = Self::default();

        let currencies = if currencies.is_empty() {
            default.currencies
        } else {
            currencies
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                max_concurrent,
                fallback = default.max_concurrent,
                "invalid worker count, using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            provider,
            currencies,
            max_concurrent,
        }
    }
}

/// Currencies used when none are configured: primary `dollars` with two
/// decimal places and whole-number `tokens` worth one cent each.
pub fn default_currencies() -> Vec<Currency> {
    vec![
        Currency::new("dollars", 2)
            .with_symbol("$")
            .with_display_names("Dollar", "Dollars")
            .primary(),
        Currency::new("tokens", 0)
            .with_symbol("T")
            .with_display_names("Token", "Tokens")
            .with_conversion_rate(Decimal::new(1, 2)),
    ]
}
