//! Optional economy features a provider may advertise
//!
//! Consumers branch on these flags instead of on the provider's identity. The
//! set is fixed and versioned with the crate; nothing here enforces a feature,
//! it only makes the check available.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A capability a provider may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionalEconomyApiFeature {
    /// Balances may go below zero through withdrawals or direct sets
    NegativeBalances,
    /// Every committed balance change is published as a transaction event
    TransactionEvents,
}

impl OptionalEconomyApiFeature {
    /// Every feature known to this version of the API
    pub const ALL: [OptionalEconomyApiFeature; 2] = [
        OptionalEconomyApiFeature::NegativeBalances,
        OptionalEconomyApiFeature::TransactionEvents,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NegativeBalances => "NEGATIVE_BALANCES",
            Self::TransactionEvents => "TRANSACTION_EVENTS",
        }
    }
}

impl fmt::Display for OptionalEconomyApiFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The subset of features a provider supports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet(BTreeSet<OptionalEconomyApiFeature>);

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, feature: OptionalEconomyApiFeature) -> bool {
        self.0.contains(&feature)
    }

    /// Add a feature; returns false if it was already present
    pub fn insert(&mut self, feature: OptionalEconomyApiFeature) -> bool {
        self.0.insert(feature)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = OptionalEconomyApiFeature> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<OptionalEconomyApiFeature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = OptionalEconomyApiFeature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.iter().map(|feature| feature.name()).collect();
        write!(f, "{}", names.join(", "))
    }
}
