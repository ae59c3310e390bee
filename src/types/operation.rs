//! Journal operation types for the replay tool
//!
//! A journal is an ordered list of account operations. Each record names the
//! account it applies to, so the replayer can keep per-account order while
//! running different accounts concurrently.

use super::account::{AccountId, PlayerId};
use rust_decimal::Decimal;

/// Operations a journal record can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a player account
    Open,

    /// Create a bank account owned by the record's player
    OpenBank,

    /// Credit funds
    Deposit,

    /// Debit funds
    Withdraw,

    /// Overwrite the balance
    SetBalance,

    /// Add the record's player to a bank's members
    AddMember,

    /// Remove the record's player from a bank's members
    RemoveMember,
}

impl Operation {
    /// Whether the record must carry a currency and an amount
    pub fn moves_funds(&self) -> bool {
        matches!(self, Self::Deposit | Self::Withdraw | Self::SetBalance)
    }

    /// Whether the record must carry a player id
    pub fn needs_player(&self) -> bool {
        matches!(self, Self::OpenBank | Self::AddMember | Self::RemoveMember)
    }
}

/// A validated journal record
///
/// `currency` and `amount` are present for fund-moving operations; `player`
/// is present for bank creation and membership changes.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub op: Operation,
    pub account: AccountId,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub player: Option<PlayerId>,
}
