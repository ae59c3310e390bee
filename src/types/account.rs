//! Account-related types
//!
//! Identifiers and the persisted image of an account. The behaviour of an
//! account lives behind the `Account` and `BankAccount` traits in
//! [`crate::core::traits`]; these are the plain values that flow through them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Account identifier (128-bit UUID)
pub type AccountId = Uuid;

/// Player identifier (128-bit UUID)
pub type PlayerId = Uuid;

/// Which family of accounts an id belongs to
///
/// Player and bank accounts live in separate namespaces, so the same UUID may
/// identify one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Player,
    Bank,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Bank => write!(f, "bank"),
        }
    }
}

/// Point-in-time image of an account handed to a ledger store
///
/// Balances are the exact stored values keyed by currency identifier; they are
/// not rounded. `owner` and `members` are only meaningful for bank accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub kind: AccountKind,
    pub name: Option<String>,
    pub balances: BTreeMap<String, Decimal>,
    pub owner: Option<PlayerId>,
    pub members: Vec<PlayerId>,
}
