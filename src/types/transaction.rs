//! Transaction event types
//!
//! Providers that advertise `TRANSACTION_EVENTS` publish one
//! [`TransactionEvent`] per committed balance change, in commit order for any
//! given account.

use super::account::{AccountId, AccountKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of balance change an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Funds credited to the account
    Deposit,

    /// Funds debited from the account
    Withdrawal,

    /// Balance overwritten (including resets to the starting balance)
    SetBalance,
}

/// A committed balance change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// The account whose balance changed
    pub account: AccountId,

    /// Player or bank account
    pub account_kind: AccountKind,

    /// Identifier of the currency that changed
    pub currency: String,

    /// What kind of change was applied
    pub kind: TransactionKind,

    /// The amount of the change, rounded to the currency precision
    ///
    /// For `SetBalance` this is the new balance itself.
    pub amount: Decimal,

    /// The balance after the change, rounded to the currency precision
    pub balance: Decimal,
}
