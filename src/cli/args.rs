use crate::config::{CurrencyLookup, ProviderConfig, ReplayConfig};
use crate::types::Currency;
use clap::Parser;
use std::path::PathBuf;

/// Replay an economy journal against the in-memory provider
#[derive(Parser, Debug)]
#[command(name = "economy-replay")]
#[command(about = "Replay an economy journal and print the resulting balances", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing journal records
    #[arg(value_name = "INPUT", help = "Path to the input CSV journal")]
    pub input_file: PathBuf,

    /// Allow withdrawals and balance overwrites below zero
    #[arg(long = "negative-balances")]
    pub negative_balances: bool,

    /// Publish a transaction event for every committed balance change
    #[arg(long = "transaction-events")]
    pub transaction_events: bool,

    /// Match currency identifiers ignoring ASCII case
    #[arg(long = "case-insensitive-currencies")]
    pub case_insensitive_currencies: bool,

    /// Currency definitions; the first one is the primary currency
    #[arg(
        long = "currency",
        value_name = "ID:PRECISION[:SYMBOL]",
        value_parser = parse_currency,
        help = "Currency definition, repeatable; the first is primary (default: dollars:2:$ and tokens:0:T)"
    )]
    pub currencies: Vec<Currency>,

    /// Number of runtime worker threads
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads replaying accounts concurrently (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Create a ReplayConfig from CLI arguments
    ///
    /// Values not given on the command line fall back to the defaults, and
    /// invalid values are replaced by defaults with a warning.
    ///
    /// # Returns
    ///
    /// A `ReplayConfig` with values from CLI arguments or defaults.
    pub fn to_replay_config(&self) -> ReplayConfig {
        let default = ProviderConfig::default();
        let currency_lookup = if self.case_insensitive_currencies {
            CurrencyLookup::CaseInsensitive
        } else {
            CurrencyLookup::Exact
        };
        let provider = ProviderConfig::new(
            self.negative_balances,
            self.transaction_events,
            currency_lookup,
            default.event_capacity,
        );

        let currencies = self
            .currencies
            .iter()
            .enumerate()
            .map(|(position, currency)| {
                if position == 0 {
                    currency.clone().primary()
                } else {
                    currency.clone()
                }
            })
            .collect();

        ReplayConfig::new(
            provider,
            currencies,
            self.max_concurrent.unwrap_or_else(num_cpus::get),
        )
    }
}

/// Parse `id:precision[:symbol]` into a currency
fn parse_currency(value: &str) -> Result<Currency, String> {
    let mut parts = value.splitn(3, ':');
    let identifier = parts
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| format!("missing currency identifier in '{}'", value))?;
    let precision = parts
        .next()
        .ok_or_else(|| format!("missing precision in '{}'", value))?
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid precision in '{}': {}", value, e))?;

    let currency = Currency::new(identifier, precision);
    Ok(match parts.next().map(str::trim) {
        Some(symbol) if !symbol.is_empty() => currency.with_symbol(symbol),
        _ => currency,
    })
}
