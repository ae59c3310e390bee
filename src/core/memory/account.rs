//! In-memory accounts with serialized, storage-backed mutation
//!
//! Every account wraps an [`AccountCore`]: the ledger behind a FIFO async
//! mutex plus a handle to the provider's shared context. A mutation
//!
//! 1. takes its place in the account's lock queue while the caller is still
//!    polling it, so calls issued in order are applied in that order,
//! 2. moves the held lock into a spawned task,
//! 3. applies the change to a draft copy of the ledger,
//! 4. persists the draft through the provider's `LedgerStore`,
//! 5. commits the draft and publishes the transaction event.
//!
//! The lock is held for the whole cycle, so every operation sees the latest
//! committed balance. A failure at any step drops the draft and leaves the
//! account untouched. Once the lock is acquired the work belongs to the
//! spawned task, and a caller that stops waiting does not interrupt it.
//!
//! Different accounts have different locks and proceed concurrently.

use crate::core::catalog::CurrencyCatalog;
use crate::core::ledger::Ledger;
use crate::core::traits::{Account, BankAccount, LedgerStore};
use crate::types::{
    AccountId, AccountKind, Currency, EconomyError, FeatureSet, OptionalEconomyApiFeature,
    PlayerId, TransactionEvent, TransactionKind,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tracing::debug;

/// State shared by a provider and all of its accounts
pub(crate) struct ProviderContext {
    pub(crate) catalog: CurrencyCatalog,
    pub(crate) features: FeatureSet,
    pub(crate) store: Arc<dyn LedgerStore>,
    pub(crate) events: Option<broadcast::Sender<TransactionEvent>>,
}

impl ProviderContext {
    fn allows_negative(&self) -> bool {
        self.features
            .contains(OptionalEconomyApiFeature::NegativeBalances)
    }

    fn publish(&self, event: TransactionEvent) {
        if let Some(sender) = &self.events {
            // no subscribers is not an error
            let _ = sender.send(event);
        }
    }
}

pub(crate) struct AccountState {
    ledger: Ledger,
    /// Set once the account is deleted or its creation failed; every later
    /// operation fails
    retired: bool,
}

/// Lock, ledger and context of one account
pub(crate) struct AccountCore {
    id: AccountId,
    kind: AccountKind,
    owner: Option<PlayerId>,
    state: Arc<Mutex<AccountState>>,
    context: Arc<ProviderContext>,
}

impl AccountCore {
    pub(crate) fn new(
        kind: AccountKind,
        owner: Option<PlayerId>,
        ledger: Ledger,
        context: Arc<ProviderContext>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: ledger.id(),
            kind,
            owner,
            state: Arc::new(Mutex::new(AccountState {
                ledger,
                retired: false,
            })),
            context,
        })
    }

    /// Read committed state under the account lock
    async fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T, EconomyError> {
        let state = self.state.lock().await;
        if state.retired {
            return Err(EconomyError::account_not_found(self.id));
        }
        Ok(f(&state.ledger))
    }

    /// Queue for the account lock
    async fn acquire(&self) -> OwnedMutexGuard<AccountState> {
        Arc::clone(&self.state).lock_owned().await
    }

    /// Hold the lock of a core nobody else has seen yet
    ///
    /// The provider claims a new account before publishing it, so the
    /// initial save is always the first operation applied.
    pub(crate) async fn claim(&self) -> OwnedMutexGuard<AccountState> {
        self.acquire().await
    }

    /// Run a mutation to completion on its own task
    async fn submit<T, F>(self: &Arc<Self>, f: F) -> Result<T, EconomyError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Ledger) -> Result<(T, Option<TransactionEvent>), EconomyError>
            + Send
            + 'static,
    {
        let state = self.acquire().await;
        let core = Arc::clone(self);
        tokio::spawn(async move { core.apply(state, f).await })
            .await
            .map_err(|e| EconomyError::operation_aborted(e.to_string()))?
    }

    async fn apply<T, F>(
        &self,
        mut state: OwnedMutexGuard<AccountState>,
        f: F,
    ) -> Result<T, EconomyError>
    where
        F: FnOnce(&mut Ledger) -> Result<(T, Option<TransactionEvent>), EconomyError>,
    {
        if state.retired {
            return Err(EconomyError::account_not_found(self.id));
        }

        let mut draft = state.ledger.clone();
        let (value, event) = f(&mut draft).inspect_err(|error| {
            debug!(account = %self.id, kind = %self.kind, %error, "mutation rejected");
        })?;

        let snapshot = draft.snapshot(self.kind, self.owner);
        self.context.store.save(&snapshot).await?;
        state.ledger = draft;

        // published under the lock so events leave in commit order
        if let Some(event) = event {
            self.context.publish(event);
        }
        Ok(value)
    }

    /// Persist the initial state of a claimed account
    ///
    /// On failure the core is retired before the lock is released, so
    /// operations queued behind the claim fail with `AccountNotFound`.
    pub(crate) async fn initialize(
        self: &Arc<Self>,
        mut state: OwnedMutexGuard<AccountState>,
    ) -> Result<(), EconomyError> {
        let core = Arc::clone(self);
        tokio::spawn(async move {
            let snapshot = state.ledger.snapshot(core.kind, core.owner);
            let saved = core.context.store.save(&snapshot).await;
            if saved.is_err() {
                state.retired = true;
            }
            saved
        })
        .await
        .map_err(|e| EconomyError::operation_aborted(e.to_string()))?
    }

    /// Remove the account from storage and reject every later operation
    ///
    /// Returns false if the account was already retired.
    pub(crate) async fn retire(self: &Arc<Self>) -> Result<bool, EconomyError> {
        let mut state = self.acquire().await;
        let core = Arc::clone(self);
        tokio::spawn(async move {
            if state.retired {
                return Ok(false);
            }
            core.context.store.remove(core.kind, core.id).await?;
            state.retired = true;
            Ok(true)
        })
        .await
        .map_err(|e| EconomyError::operation_aborted(e.to_string()))?
    }

    async fn change_balance(
        self: &Arc<Self>,
        kind: TransactionKind,
        amount: Decimal,
        currency: &Currency,
    ) -> Result<Decimal, EconomyError> {
        let currency = self.context.catalog.resolve(currency)?.clone();
        let allow_negative = self.context.allows_negative();
        let account_kind = self.kind;

        self.submit(move |ledger| {
            let balance = match kind {
                TransactionKind::Deposit => ledger.deposit(amount, &currency)?,
                TransactionKind::Withdrawal => {
                    ledger.withdraw(amount, &currency, allow_negative)?
                }
                TransactionKind::SetBalance => {
                    ledger.set_balance(amount, &currency, allow_negative)?
                }
            };
            let event = TransactionEvent {
                account: ledger.id(),
                account_kind,
                currency: currency.identifier().to_string(),
                kind,
                amount: currency.round(amount),
                balance,
            };
            Ok((balance, Some(event)))
        })
        .await
    }

    async fn balance(&self, currency: &Currency) -> Result<Decimal, EconomyError> {
        let currency = self.context.catalog.resolve(currency)?;
        self.read(|ledger| ledger.balance(currency)).await
    }

    async fn can_afford(&self, amount: Decimal, currency: &Currency) -> Result<bool, EconomyError> {
        let currency = self.context.catalog.resolve(currency)?;
        self.read(|ledger| ledger.can_afford(amount, currency)).await
    }

    async fn name(&self) -> Result<Option<String>, EconomyError> {
        self.read(|ledger| ledger.name().map(str::to_string)).await
    }

    async fn set_name(self: &Arc<Self>, name: Option<String>) -> Result<(), EconomyError> {
        self.submit(move |ledger| {
            ledger.set_name(name);
            Ok(((), None))
        })
        .await
    }

    async fn held_currencies(&self) -> Result<Vec<String>, EconomyError> {
        self.read(Ledger::held_currencies).await
    }
}

/// Forward the [`Account`] contract to the wrapped `core`
macro_rules! impl_account {
    ($account:ty) => {
        #[async_trait]
        impl Account for $account {
            fn id(&self) -> AccountId {
                self.core.id
            }

            async fn name(&self) -> Result<Option<String>, EconomyError> {
                self.core.name().await
            }

            async fn set_name(&self, name: Option<String>) -> Result<(), EconomyError> {
                self.core.set_name(name).await
            }

            async fn balance(&self, currency: &Currency) -> Result<Decimal, EconomyError> {
                self.core.balance(currency).await
            }

            async fn deposit(
                &self,
                amount: Decimal,
                currency: &Currency,
            ) -> Result<Decimal, EconomyError> {
                self.core
                    .change_balance(TransactionKind::Deposit, amount, currency)
                    .await
            }

            async fn withdraw(
                &self,
                amount: Decimal,
                currency: &Currency,
            ) -> Result<Decimal, EconomyError> {
                self.core
                    .change_balance(TransactionKind::Withdrawal, amount, currency)
                    .await
            }

            async fn set_balance(
                &self,
                amount: Decimal,
                currency: &Currency,
            ) -> Result<Decimal, EconomyError> {
                self.core
                    .change_balance(TransactionKind::SetBalance, amount, currency)
                    .await
            }

            async fn can_afford(
                &self,
                amount: Decimal,
                currency: &Currency,
            ) -> Result<bool, EconomyError> {
                self.core.can_afford(amount, currency).await
            }

            async fn held_currencies(&self) -> Result<Vec<String>, EconomyError> {
                self.core.held_currencies().await
            }
        }
    };
}

/// A player account held by [`MemoryEconomy`](super::MemoryEconomy)
pub struct MemoryAccount {
    core: Arc<AccountCore>,
}

impl MemoryAccount {
    pub(crate) fn new(core: Arc<AccountCore>) -> Self {
        Self { core }
    }

    pub(crate) fn core(&self) -> &Arc<AccountCore> {
        &self.core
    }
}

impl_account!(MemoryAccount);

/// A bank account held by [`MemoryEconomy`](super::MemoryEconomy)
pub struct MemoryBankAccount {
    core: Arc<AccountCore>,
    owner: PlayerId,
}

impl MemoryBankAccount {
    pub(crate) fn new(core: Arc<AccountCore>, owner: PlayerId) -> Self {
        Self { core, owner }
    }

    pub(crate) fn core(&self) -> &Arc<AccountCore> {
        &self.core
    }
}

impl_account!(MemoryBankAccount);

#[async_trait]
impl BankAccount for MemoryBankAccount {
    fn owning_player_id(&self) -> PlayerId {
        self.owner
    }

    async fn bank_member_ids(&self) -> Result<Vec<PlayerId>, EconomyError> {
        self.core.read(|ledger| ledger.members().to_vec()).await
    }

    async fn add_bank_member(&self, player: PlayerId) -> Result<(), EconomyError> {
        self.core
            .submit(move |ledger| {
                ledger.add_member(player);
                Ok(((), None))
            })
            .await
    }

    async fn remove_bank_member(&self, player: PlayerId) -> Result<(), EconomyError> {
        self.core
            .submit(move |ledger| {
                ledger.remove_member(player);
                Ok(((), None))
            })
            .await
    }

    fn as_account(&self) -> &dyn Account {
        self
    }
}
