//! Per-account ledger state and mutation rules
//!
//! `Ledger` is the plain, synchronous state behind one account: balances per
//! currency, the display name and (for banks) the member list. It knows the
//! arithmetic rules of every mutation but nothing about locking or storage;
//! providers serialize access to it and decide when a mutated copy is
//! committed.
//!
//! # Rounding
//!
//! Balances are stored exactly. Every value that leaves the ledger (reads and
//! mutation results) is rounded half-up to the currency precision, while the
//! invariant checks use the exact stored value. Sub-unit mutations therefore
//! accumulate without drifting from the exact total.

use crate::types::{AccountId, AccountKind, AccountSnapshot, Currency, EconomyError, PlayerId};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Balance and membership state of one account
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    id: AccountId,
    name: Option<String>,
    /// Exact balances keyed by canonical currency identifier
    balances: HashMap<String, Decimal>,
    /// Bank members in insertion order, without duplicates
    members: Vec<PlayerId>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new(id: AccountId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            balances: HashMap::new(),
            members: Vec::new(),
        }
    }

    /// Create a ledger seeded with each currency's non-zero starting balance
    pub fn with_starting_balances<'a>(
        id: AccountId,
        name: Option<String>,
        currencies: impl IntoIterator<Item = &'a Currency>,
    ) -> Self {
        let mut ledger = Self::new(id, name);
        for currency in currencies {
            if !currency.starting_balance().is_zero() {
                ledger
                    .balances
                    .insert(currency.identifier().to_string(), currency.starting_balance());
            }
        }
        ledger
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Exact stored balance, zero if the currency was never touched
    pub fn exact_balance(&self, currency: &Currency) -> Decimal {
        self.balances
            .get(currency.identifier())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Balance rounded to the currency precision
    pub fn balance(&self, currency: &Currency) -> Decimal {
        currency.round(self.exact_balance(currency))
    }

    /// Whether the exact balance covers `amount`
    pub fn can_afford(&self, amount: Decimal, currency: &Currency) -> bool {
        self.exact_balance(currency) >= amount
    }

    /// Identifiers of every currency this account holds an entry for, sorted
    pub fn held_currencies(&self) -> Vec<String> {
        let mut held: Vec<String> = self.balances.keys().cloned().collect();
        held.sort();
        held
    }

    /// Credit `amount`; returns the rounded new balance
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is negative
    /// * `ArithmeticOverflow` - the new balance is not representable
    pub fn deposit(&mut self, amount: Decimal, currency: &Currency) -> Result<Decimal, EconomyError> {
        if amount < Decimal::ZERO {
            return Err(EconomyError::invalid_amount(amount, "deposit"));
        }

        let updated = self
            .exact_balance(currency)
            .checked_add(amount)
            .ok_or_else(|| EconomyError::arithmetic_overflow("deposit", self.id))?;

        Ok(self.commit_balance(currency, updated))
    }

    /// Debit `amount`; returns the rounded new balance
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is negative
    /// * `InsufficientFunds` - the result would be negative and
    ///   `allow_negative` is false; the balance is left unchanged. The error
    ///   carries the exact balance, which may differ from the rounded reading
    /// * `ArithmeticOverflow` - the new balance is not representable
    pub fn withdraw(
        &mut self,
        amount: Decimal,
        currency: &Currency,
        allow_negative: bool,
    ) -> Result<Decimal, EconomyError> {
        if amount < Decimal::ZERO {
            return Err(EconomyError::invalid_amount(amount, "withdraw"));
        }

        let current = self.exact_balance(currency);
        let updated = current
            .checked_sub(amount)
            .ok_or_else(|| EconomyError::arithmetic_overflow("withdraw", self.id))?;

        if updated < Decimal::ZERO && !allow_negative {
            return Err(EconomyError::insufficient_funds(
                self.id,
                currency.identifier(),
                current,
                amount,
            ));
        }

        Ok(self.commit_balance(currency, updated))
    }

    /// Overwrite the balance; returns the rounded new balance
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is negative and `allow_negative` is false
    pub fn set_balance(
        &mut self,
        amount: Decimal,
        currency: &Currency,
        allow_negative: bool,
    ) -> Result<Decimal, EconomyError> {
        if amount < Decimal::ZERO && !allow_negative {
            return Err(EconomyError::invalid_amount(amount, "set balance"));
        }

        Ok(self.commit_balance(currency, amount))
    }

    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    /// Add a member; returns false if already present
    pub fn add_member(&mut self, player: PlayerId) -> bool {
        if self.members.contains(&player) {
            return false;
        }
        self.members.push(player);
        true
    }

    /// Remove a member; returns false if absent
    pub fn remove_member(&mut self, player: PlayerId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| *member != player);
        self.members.len() != before
    }

    /// Persistable image of this ledger
    pub fn snapshot(&self, kind: AccountKind, owner: Option<PlayerId>) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            kind,
            name: self.name.clone(),
            balances: self
                .balances
                .iter()
                .map(|(currency, amount)| (currency.clone(), *amount))
                .collect(),
            owner,
            members: self.members.clone(),
        }
    }

    fn commit_balance(&mut self, currency: &Currency, exact: Decimal) -> Decimal {
        self.balances.insert(currency.identifier().to_string(), exact);
        currency.round(exact)
    }
}
