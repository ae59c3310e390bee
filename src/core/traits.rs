//! Core traits for accounts, providers and ledger storage
//!
//! These are the contracts consumer code depends on. A backend implements
//! [`EconomyProvider`] (and hands out [`Account`] / [`BankAccount`] trait
//! objects); consumers resolve the active provider through the service
//! registry and never name the concrete type.
//!
//! Every operation that may touch durable storage is `async` and reports its
//! outcome through its `Result`. Callers must not assume in-place completion.

use crate::types::{
    AccountId, AccountKind, AccountSnapshot, Currency, EconomyError, FeatureSet,
    OptionalEconomyApiFeature, PlayerId, TransactionEvent,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A ledger identity holding balances in one or more currencies
///
/// Implementations serialize every mutation on the same account: operations
/// issued in order by one caller apply in that order, and concurrent
/// operations never lose an update. All returned amounts are rounded
/// half-up to the currency precision.
#[async_trait]
pub trait Account: Send + Sync {
    /// The account's unique identifier
    fn id(&self) -> AccountId;

    /// Optional display name
    async fn name(&self) -> Result<Option<String>, EconomyError>;

    async fn set_name(&self, name: Option<String>) -> Result<(), EconomyError>;

    /// Current balance in `currency`
    async fn balance(&self, currency: &Currency) -> Result<Decimal, EconomyError>;

    /// Credit a non-negative amount; returns the new balance
    async fn deposit(&self, amount: Decimal, currency: &Currency)
        -> Result<Decimal, EconomyError>;

    /// Debit a non-negative amount; returns the new balance
    ///
    /// Fails with `InsufficientFunds` when the balance would go negative and
    /// the provider does not support `NEGATIVE_BALANCES`. The check uses the
    /// exact stored balance: a balance of 9.995 reads as 10.00 but cannot
    /// cover a withdrawal of 10.00.
    async fn withdraw(&self, amount: Decimal, currency: &Currency)
        -> Result<Decimal, EconomyError>;

    /// Overwrite the balance; returns the new balance
    async fn set_balance(
        &self,
        amount: Decimal,
        currency: &Currency,
    ) -> Result<Decimal, EconomyError>;

    /// Reset the balance to the currency's starting balance
    async fn reset_balance(&self, currency: &Currency) -> Result<Decimal, EconomyError> {
        self.set_balance(currency.starting_balance(), currency).await
    }

    /// Whether the exact stored balance covers `amount`
    ///
    /// Agrees with `withdraw`, not with the rounded `balance` reading.
    async fn can_afford(&self, amount: Decimal, currency: &Currency) -> Result<bool, EconomyError>;

    /// Identifiers of the currencies this account holds a balance in
    async fn held_currencies(&self) -> Result<Vec<String>, EconomyError>;
}

/// An account owned by a player and shared with a set of members
#[async_trait]
pub trait BankAccount: Account {
    /// The player owning the bank
    fn owning_player_id(&self) -> PlayerId;

    /// Members in insertion order, without duplicates
    async fn bank_member_ids(&self) -> Result<Vec<PlayerId>, EconomyError>;

    /// Make `player` a member; adding an existing member is a no-op
    async fn add_bank_member(&self, player: PlayerId) -> Result<(), EconomyError>;

    /// Revoke membership; removing a non-member is a no-op
    async fn remove_bank_member(&self, player: PlayerId) -> Result<(), EconomyError>;

    /// This bank viewed as a plain account
    fn as_account(&self) -> &dyn Account;

    /// Whether `player` owns the bank (value equality on the id)
    fn is_bank_owner(&self, player: PlayerId) -> bool {
        self.owning_player_id() == player
    }

    /// Whether `player` is listed as a member
    ///
    /// The owner is not implicitly a member; callers wanting "owner or member"
    /// must check [`BankAccount::is_bank_owner`] as well.
    async fn is_bank_member(&self, player: PlayerId) -> Result<bool, EconomyError> {
        Ok(self.bank_member_ids().await?.contains(&player))
    }

    /// Whether `player` may act on the bank: the owner or any member
    async fn has_bank_access(&self, player: PlayerId) -> Result<bool, EconomyError> {
        if self.is_bank_owner(player) {
            return Ok(true);
        }
        self.is_bank_member(player).await
    }
}

/// The capability an economy backend implements
///
/// Registered in the [`ServiceRegistry`](crate::core::ServiceRegistry) as
/// `dyn EconomyProvider`.
#[async_trait]
pub trait EconomyProvider: Send + Sync {
    /// Optional features this provider supports
    fn supported_features(&self) -> FeatureSet;

    fn supports(&self, feature: OptionalEconomyApiFeature) -> bool {
        self.supported_features().contains(feature)
    }

    fn primary_currency(&self) -> Currency;

    /// Every currency offered, in declaration order
    fn currencies(&self) -> Vec<Currency>;

    /// Look a currency up under the provider's identifier policy
    fn find_currency(&self, identifier: &str) -> Option<Currency>;

    async fn has_account(&self, id: AccountId) -> Result<bool, EconomyError>;

    /// Fails with `AccountNotFound` if no such account exists
    async fn retrieve_account(&self, id: AccountId) -> Result<Arc<dyn Account>, EconomyError>;

    /// Fails with `AccountAlreadyExists` if the id is taken
    async fn create_account(
        &self,
        id: AccountId,
        name: Option<String>,
    ) -> Result<Arc<dyn Account>, EconomyError>;

    /// Retrieve the account, creating it if it does not exist yet
    async fn retrieve_or_create_account(
        &self,
        id: AccountId,
    ) -> Result<Arc<dyn Account>, EconomyError> {
        match self.retrieve_account(id).await {
            Err(EconomyError::AccountNotFound { .. }) => {}
            other => return other,
        }
        match self.create_account(id, None).await {
            Err(EconomyError::AccountAlreadyExists { .. }) => self.retrieve_account(id).await,
            other => other,
        }
    }

    async fn account_ids(&self) -> Result<Vec<AccountId>, EconomyError>;

    /// Delete an account; returns false if it did not exist
    async fn delete_account(&self, id: AccountId) -> Result<bool, EconomyError>;

    async fn has_bank_account(&self, id: AccountId) -> Result<bool, EconomyError>;

    /// Fails with `AccountNotFound` if no such bank exists
    async fn retrieve_bank_account(
        &self,
        id: AccountId,
    ) -> Result<Arc<dyn BankAccount>, EconomyError>;

    /// Fails with `AccountAlreadyExists` if the id is taken
    async fn create_bank_account(
        &self,
        id: AccountId,
        owner: PlayerId,
        name: Option<String>,
    ) -> Result<Arc<dyn BankAccount>, EconomyError>;

    async fn bank_account_ids(&self) -> Result<Vec<AccountId>, EconomyError>;

    /// Delete a bank account; returns false if it did not exist
    async fn delete_bank_account(&self, id: AccountId) -> Result<bool, EconomyError>;

    /// Stream of committed balance changes
    ///
    /// `None` unless the provider advertises `TRANSACTION_EVENTS`.
    fn subscribe_transactions(&self) -> Option<broadcast::Receiver<TransactionEvent>> {
        None
    }
}

/// Persistence port for account state
///
/// A provider hands a snapshot to the store before committing a mutation; if
/// the store fails, the mutation is discarded.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn save(&self, snapshot: &AccountSnapshot) -> Result<(), EconomyError>;

    async fn remove(&self, kind: AccountKind, id: AccountId) -> Result<(), EconomyError>;
}
