//! In-memory reference economy provider
//!
//! [`MemoryEconomy`] implements the full provider contract on top of two
//! concurrent maps (player accounts and bank accounts live in separate
//! namespaces) and a pluggable [`LedgerStore`]. Account creation is atomic per
//! id: exactly one of several racing creators wins, the others get
//! `AccountAlreadyExists`. A new account is locked before it becomes visible,
//! so nothing can be applied to it until its first snapshot is stored.

use super::account::{AccountCore, MemoryAccount, MemoryBankAccount, ProviderContext};
use super::store::MemoryLedgerStore;
use crate::config::ProviderConfig;
use crate::core::catalog::CurrencyCatalog;
use crate::core::ledger::Ledger;
use crate::core::traits::{Account, BankAccount, EconomyProvider, LedgerStore};
use crate::types::{
    AccountId, AccountKind, Currency, EconomyError, FeatureSet, PlayerId, TransactionEvent,
};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Economy provider keeping all accounts in memory
pub struct MemoryEconomy {
    context: Arc<ProviderContext>,
    accounts: DashMap<AccountId, Arc<MemoryAccount>>,
    banks: DashMap<AccountId, Arc<MemoryBankAccount>>,
}

impl MemoryEconomy {
    /// Create a provider persisting to a fresh [`MemoryLedgerStore`]
    ///
    /// # Arguments
    ///
    /// * `config` - Feature flags, lookup policy and event buffer size
    /// * `currencies` - Currencies offered; exactly one must be primary
    ///
    /// # Returns
    ///
    /// * `Ok(MemoryEconomy)` - Ready to register
    /// * `Err(EconomyError)` - The currency list is invalid
    pub fn new(config: &ProviderConfig, currencies: Vec<Currency>) -> Result<Self, EconomyError> {
        Self::with_store(config, currencies, Arc::new(MemoryLedgerStore::new()))
    }

    /// Create a provider persisting through `store`
    pub fn with_store(
        config: &ProviderConfig,
        currencies: Vec<Currency>,
        store: Arc<dyn LedgerStore>,
    ) -> Result<Self, EconomyError> {
        let catalog = CurrencyCatalog::new(currencies, config.currency_lookup)?;
        let features = config.features();
        let events = config.transaction_events.then(|| {
            let (sender, _) = broadcast::channel(config.event_capacity.max(1));
            sender
        });

        info!(
            primary = %catalog.primary(),
            currencies = catalog.len(),
            features = %features,
            "economy provider ready"
        );

        Ok(Self {
            context: Arc::new(ProviderContext {
                catalog,
                features,
                store,
                events,
            }),
            accounts: DashMap::new(),
            banks: DashMap::new(),
        })
    }

    fn new_ledger(&self, id: AccountId, name: Option<String>) -> Ledger {
        Ledger::with_starting_balances(id, name, self.context.catalog.all())
    }
}

#[async_trait]
impl EconomyProvider for MemoryEconomy {
    fn supported_features(&self) -> FeatureSet {
        self.context.features.clone()
    }

    fn primary_currency(&self) -> Currency {
        self.context.catalog.primary().clone()
    }

    fn currencies(&self) -> Vec<Currency> {
        self.context.catalog.all().to_vec()
    }

    fn find_currency(&self, identifier: &str) -> Option<Currency> {
        self.context.catalog.find(identifier).cloned()
    }

    async fn has_account(&self, id: AccountId) -> Result<bool, EconomyError> {
        Ok(self.accounts.contains_key(&id))
    }

    async fn retrieve_account(&self, id: AccountId) -> Result<Arc<dyn Account>, EconomyError> {
        let account = self
            .accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EconomyError::account_not_found(id))?;
        Ok(account)
    }

    async fn create_account(
        &self,
        id: AccountId,
        name: Option<String>,
    ) -> Result<Arc<dyn Account>, EconomyError> {
        let core = AccountCore::new(
            AccountKind::Player,
            None,
            self.new_ledger(id, name),
            Arc::clone(&self.context),
        );
        let claim = core.claim().await;
        let account = match self.accounts.entry(id) {
            Entry::Occupied(_) => return Err(EconomyError::account_already_exists(id)),
            Entry::Vacant(slot) => {
                Arc::clone(slot.insert(Arc::new(MemoryAccount::new(core))).value())
            }
        };

        if let Err(error) = account.core().initialize(claim).await {
            self.accounts
                .remove_if(&id, |_, existing| Arc::ptr_eq(existing, &account));
            return Err(error);
        }

        debug!(account = %id, "player account created");
        Ok(account)
    }

    async fn account_ids(&self) -> Result<Vec<AccountId>, EconomyError> {
        let mut ids: Vec<AccountId> = self.accounts.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn delete_account(&self, id: AccountId) -> Result<bool, EconomyError> {
        let Some((_, account)) = self.accounts.remove(&id) else {
            return Ok(false);
        };
        match account.core().retire().await {
            Ok(_) => {
                debug!(account = %id, "player account deleted");
                Ok(true)
            }
            Err(error) => {
                self.accounts.entry(id).or_insert(account);
                Err(error)
            }
        }
    }

    async fn has_bank_account(&self, id: AccountId) -> Result<bool, EconomyError> {
        Ok(self.banks.contains_key(&id))
    }

    async fn retrieve_bank_account(
        &self,
        id: AccountId,
    ) -> Result<Arc<dyn BankAccount>, EconomyError> {
        let bank = self
            .banks
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EconomyError::account_not_found(id))?;
        Ok(bank)
    }

    async fn create_bank_account(
        &self,
        id: AccountId,
        owner: PlayerId,
        name: Option<String>,
    ) -> Result<Arc<dyn BankAccount>, EconomyError> {
        let core = AccountCore::new(
            AccountKind::Bank,
            Some(owner),
            self.new_ledger(id, name),
            Arc::clone(&self.context),
        );
        let claim = core.claim().await;
        let bank = match self.banks.entry(id) {
            Entry::Occupied(_) => return Err(EconomyError::account_already_exists(id)),
            Entry::Vacant(slot) => {
                Arc::clone(slot.insert(Arc::new(MemoryBankAccount::new(core, owner))).value())
            }
        };

        if let Err(error) = bank.core().initialize(claim).await {
            self.banks
                .remove_if(&id, |_, existing| Arc::ptr_eq(existing, &bank));
            return Err(error);
        }

        debug!(account = %id, owner = %owner, "bank account created");
        Ok(bank)
    }

    async fn bank_account_ids(&self) -> Result<Vec<AccountId>, EconomyError> {
        let mut ids: Vec<AccountId> = self.banks.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn delete_bank_account(&self, id: AccountId) -> Result<bool, EconomyError> {
        let Some((_, bank)) = self.banks.remove(&id) else {
            return Ok(false);
        };
        match bank.core().retire().await {
            Ok(_) => {
                debug!(account = %id, "bank account deleted");
                Ok(true)
            }
            Err(error) => {
                self.banks.entry(id).or_insert(bank);
                Err(error)
            }
        }
    }

    fn subscribe_transactions(&self) -> Option<broadcast::Receiver<TransactionEvent>> {
        self.context.events.as_ref().map(broadcast::Sender::subscribe)
    }
}
