//! Registration priority tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier used to arbitrate between several registered implementations
///
/// Ordered `Low < Normal < High < Highest`; the registry resolves the highest
/// tier, breaking ties by registration order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ServicePriority {
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

impl fmt::Display for ServicePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Highest => "highest",
        };
        write!(f, "{}", name)
    }
}
