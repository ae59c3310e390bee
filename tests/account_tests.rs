//! Account semantics through the provider contract
//!
//! These tests drive the in-memory provider only through the `EconomyProvider`
//! / `Account` / `BankAccount` traits: ordering and atomicity of concurrent
//! mutations, storage failures, transaction events, currency lookup policy,
//! cancellation, and deletion.

use async_trait::async_trait;
use economy_registry::{
    Account, AccountId, AccountKind, AccountSnapshot, BankAccount, Currency, CurrencyLookup,
    EconomyError, EconomyProvider, LedgerStore, MemoryEconomy, MemoryLedgerStore,
    ProviderConfig, TransactionKind,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn currencies() -> Vec<Currency> {
    vec![
        Currency::new("dollars", 2).with_symbol("$").primary(),
        Currency::new("tokens", 0).with_conversion_rate(dec!(0.01)),
    ]
}

fn config(negative_balances: bool, transaction_events: bool) -> ProviderConfig {
    ProviderConfig::new(
        negative_balances,
        transaction_events,
        CurrencyLookup::Exact,
        1024,
    )
}

fn economy() -> MemoryEconomy {
    MemoryEconomy::new(&config(false, false), currencies()).unwrap()
}

/// Store whose writes can be switched to fail
#[derive(Default)]
struct FlakyStore {
    failing: AtomicBool,
    inner: MemoryLedgerStore,
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn save(&self, snapshot: &AccountSnapshot) -> Result<(), EconomyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EconomyError::storage("disk unavailable"));
        }
        self.inner.save(snapshot).await
    }

    async fn remove(&self, kind: AccountKind, id: AccountId) -> Result<(), EconomyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EconomyError::storage("disk unavailable"));
        }
        self.inner.remove(kind, id).await
    }
}

/// Store that fails its first save after a delay
struct FailFirstSave {
    failed: AtomicBool,
    inner: MemoryLedgerStore,
}

#[async_trait]
impl LedgerStore for FailFirstSave {
    async fn save(&self, snapshot: &AccountSnapshot) -> Result<(), EconomyError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(50)).await;
            return Err(EconomyError::storage("disk unavailable"));
        }
        self.inner.save(snapshot).await
    }

    async fn remove(&self, kind: AccountKind, id: AccountId) -> Result<(), EconomyError> {
        self.inner.remove(kind, id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_operations_apply_in_issue_order() {
    let economy = economy();
    let dollars = economy.primary_currency();

    for _ in 0..200 {
        let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();
        let (first, second) = tokio::join!(
            account.set_balance(dec!(5), &dollars),
            account.set_balance(dec!(7), &dollars),
        );
        assert_eq!(first.unwrap(), dec!(5.00));
        assert_eq!(second.unwrap(), dec!(7.00));
        assert_eq!(account.balance(&dollars).await.unwrap(), dec!(7.00));

        let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();
        let (deposited, withdrawn) = tokio::join!(
            account.deposit(dec!(10), &dollars),
            account.withdraw(dec!(10), &dollars),
        );
        assert_eq!(deposited.unwrap(), dec!(10.00));
        assert_eq!(withdrawn.unwrap(), dec!(0.00));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_creation_rejects_queued_operations() {
    let store = Arc::new(FailFirstSave {
        failed: AtomicBool::new(false),
        inner: MemoryLedgerStore::new(),
    });
    let economy = Arc::new(
        MemoryEconomy::with_store(&config(false, false), currencies(), store.clone()).unwrap(),
    );
    let dollars = economy.primary_currency();
    let id = Uuid::new_v4();

    let creator = {
        let economy = Arc::clone(&economy);
        tokio::spawn(async move { economy.create_account(id, None).await.map(|_| ()) })
    };
    while !economy.has_account(id).await.unwrap() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let account = economy.retrieve_account(id).await.unwrap();
    let deposited = account.deposit(dec!(10), &dollars).await;
    assert_eq!(deposited.unwrap_err(), EconomyError::account_not_found(id));

    let created = creator.await.unwrap();
    assert_eq!(created.unwrap_err(), EconomyError::storage("disk unavailable"));
    assert!(!economy.has_account(id).await.unwrap());
    assert!(store.inner.snapshot(AccountKind::Player, id).is_none());

    // the id is free again
    let account = economy.create_account(id, None).await.unwrap();
    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(0.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposit_and_withdraw() {
    let economy = economy();
    let dollars = economy.primary_currency();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();
    account.deposit(dec!(20.00), &dollars).await.unwrap();

    let (deposited, withdrawn) = tokio::join!(
        account.deposit(dec!(10.00), &dollars),
        account.withdraw(dec!(4.00), &dollars),
    );
    deposited.unwrap();
    withdrawn.unwrap();

    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(26.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_mutations_lose_nothing() {
    let economy = MemoryEconomy::with_store(
        &config(false, false),
        currencies(),
        Arc::new(MemoryLedgerStore::with_latency(Duration::from_millis(1))),
    )
    .unwrap();
    let dollars = economy.primary_currency();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();

    let deposits = (0..100).map(|_| account.deposit(dec!(0.01), &dollars));
    for result in join_all(deposits).await {
        result.unwrap();
    }

    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(1.00));
}

#[tokio::test]
async fn test_over_withdrawal_leaves_balance_unchanged() {
    let economy = economy();
    let dollars = economy.primary_currency();
    let id = Uuid::new_v4();
    let account = economy.create_account(id, None).await.unwrap();
    account.deposit(dec!(5.00), &dollars).await.unwrap();

    let result = account.withdraw(dec!(5.01), &dollars).await;
    assert_eq!(
        result.unwrap_err(),
        EconomyError::insufficient_funds(id, "dollars", dec!(5.00), dec!(5.01))
    );
    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(5.00));
    assert!(account.can_afford(dec!(5.00), &dollars).await.unwrap());
    assert!(!account.can_afford(dec!(5.01), &dollars).await.unwrap());
}

#[tokio::test]
async fn test_negative_balances_when_supported() {
    let economy = MemoryEconomy::new(&config(true, false), currencies()).unwrap();
    let dollars = economy.primary_currency();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();

    assert_eq!(account.withdraw(dec!(3), &dollars).await.unwrap(), dec!(-3.00));
    assert_eq!(account.set_balance(dec!(-8.5), &dollars).await.unwrap(), dec!(-8.50));
}

#[tokio::test]
async fn test_negative_amounts_are_rejected() {
    let economy = economy();
    let dollars = economy.primary_currency();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();

    assert!(matches!(
        account.deposit(dec!(-1), &dollars).await,
        Err(EconomyError::InvalidAmount { .. })
    ));
    assert!(matches!(
        account.withdraw(dec!(-1), &dollars).await,
        Err(EconomyError::InvalidAmount { .. })
    ));
    assert!(matches!(
        account.set_balance(dec!(-1), &dollars).await,
        Err(EconomyError::InvalidAmount { .. })
    ));
    assert_eq!(account.balance(&dollars).await.unwrap(), Decimal::ZERO);
}

#[tokio::test]
async fn test_reset_balance_uses_starting_balance() {
    let gems = Currency::new("gems", 0).with_starting_balance(dec!(25));
    let economy = MemoryEconomy::new(
        &config(false, false),
        vec![Currency::new("dollars", 2).primary(), gems.clone()],
    )
    .unwrap();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();

    assert_eq!(account.balance(&gems).await.unwrap(), dec!(25));
    account.withdraw(dec!(20), &gems).await.unwrap();
    assert_eq!(account.reset_balance(&gems).await.unwrap(), dec!(25));
}

#[tokio::test]
async fn test_storage_failure_leaves_state_untouched() {
    let store = Arc::new(FlakyStore::default());
    let economy =
        MemoryEconomy::with_store(&config(false, true), currencies(), store.clone()).unwrap();
    let mut events = economy.subscribe_transactions().unwrap();
    let dollars = economy.primary_currency();
    let id = Uuid::new_v4();
    let account = economy.create_account(id, None).await.unwrap();
    account.deposit(dec!(10), &dollars).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);
    let result = account.deposit(dec!(5), &dollars).await;
    assert_eq!(result.unwrap_err(), EconomyError::storage("disk unavailable"));
    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(10.00));

    // a failed delete keeps the account usable
    assert!(economy.delete_account(id).await.is_err());
    assert!(economy.has_account(id).await.unwrap());

    // failed creation does not leave a half-created account behind
    let fresh = Uuid::new_v4();
    assert!(economy.create_account(fresh, None).await.is_err());
    assert!(!economy.has_account(fresh).await.unwrap());

    store.failing.store(false, Ordering::SeqCst);
    account.deposit(dec!(1), &dollars).await.unwrap();

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();
    assert_eq!(first.balance, dec!(10.00));
    assert_eq!(second.balance, dec!(11.00));
    assert!(events.try_recv().is_err());

    let snapshot = store.inner.snapshot(AccountKind::Player, id).unwrap();
    assert_eq!(snapshot.balances.get("dollars"), Some(&dec!(11)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_events_arrive_in_commit_order() {
    let economy = MemoryEconomy::new(&config(false, true), currencies()).unwrap();
    let mut events = economy.subscribe_transactions().unwrap();
    let tokens = economy.find_currency("tokens").unwrap();
    let id = Uuid::new_v4();
    let account = economy.create_account(id, None).await.unwrap();

    let deposits = (0..20).map(|_| account.deposit(dec!(1), &tokens));
    for result in join_all(deposits).await {
        result.unwrap();
    }

    for expected in 1..=20 {
        let event = events.recv().await.unwrap();
        assert_eq!(event.account, id);
        assert_eq!(event.account_kind, AccountKind::Player);
        assert_eq!(event.currency, "tokens");
        assert_eq!(event.kind, TransactionKind::Deposit);
        assert_eq!(event.amount, dec!(1));
        assert_eq!(event.balance, Decimal::from(expected));
    }
}

#[tokio::test]
async fn test_rejected_operations_publish_nothing() {
    let economy = MemoryEconomy::new(&config(false, true), currencies()).unwrap();
    let mut events = economy.subscribe_transactions().unwrap();
    let dollars = economy.primary_currency();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();

    assert!(account.withdraw(dec!(1), &dollars).await.is_err());
    account.set_balance(dec!(4), &dollars).await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, TransactionKind::SetBalance);
    assert_eq!(event.balance, dec!(4.00));
}

#[tokio::test]
async fn test_case_insensitive_currency_lookup() {
    let config = ProviderConfig::new(false, false, CurrencyLookup::CaseInsensitive, 16);
    let economy = MemoryEconomy::new(&config, currencies()).unwrap();

    let found = economy.find_currency("DOLLARS").unwrap();
    assert_eq!(found.identifier(), "dollars");

    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();
    account
        .deposit(dec!(2), &Currency::new("Dollars", 2))
        .await
        .unwrap();
    assert_eq!(account.balance(&found).await.unwrap(), dec!(2.00));
    assert_eq!(account.held_currencies().await.unwrap(), vec!["dollars"]);
}

#[tokio::test]
async fn test_exact_lookup_rejects_case_variants() {
    let economy = economy();
    assert!(economy.find_currency("DOLLARS").is_none());

    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();
    let result = account.deposit(dec!(2), &Currency::new("DOLLARS", 2)).await;
    assert_eq!(result.unwrap_err(), EconomyError::unknown_currency("DOLLARS"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_future_still_completes() {
    let economy = MemoryEconomy::with_store(
        &config(false, false),
        currencies(),
        Arc::new(MemoryLedgerStore::with_latency(Duration::from_millis(50))),
    )
    .unwrap();
    let dollars = economy.primary_currency();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(1), account.deposit(dec!(7), &dollars)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(7.00));
}

#[tokio::test]
async fn test_deleted_account_rejects_operations() {
    let economy = economy();
    let dollars = economy.primary_currency();
    let id = Uuid::new_v4();
    let account = economy.create_account(id, None).await.unwrap();

    assert!(economy.delete_account(id).await.unwrap());

    let not_found = EconomyError::account_not_found(id);
    assert_eq!(account.deposit(dec!(1), &dollars).await.unwrap_err(), not_found);
    assert_eq!(account.balance(&dollars).await.unwrap_err(), not_found);
    assert_eq!(account.name().await.unwrap_err(), not_found);

    // the id is free again
    let recreated = economy.create_account(id, None).await.unwrap();
    assert_eq!(recreated.balance(&dollars).await.unwrap(), Decimal::ZERO);
}

#[tokio::test]
async fn test_account_names() {
    let economy = economy();
    let account = economy
        .create_account(Uuid::new_v4(), Some("alice".to_string()))
        .await
        .unwrap();
    assert_eq!(account.name().await.unwrap().as_deref(), Some("alice"));

    account.set_name(None).await.unwrap();
    assert_eq!(account.name().await.unwrap(), None);
}

#[tokio::test]
async fn test_rounding_is_half_up_without_drift() {
    let economy = economy();
    let dollars = economy.primary_currency();
    let account = economy.create_account(Uuid::new_v4(), None).await.unwrap();

    assert_eq!(account.deposit(dec!(0.005), &dollars).await.unwrap(), dec!(0.01));
    for _ in 0..9 {
        account.deposit(dec!(0.001), &dollars).await.unwrap();
    }
    // exact total 0.014
    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(0.01));
    account.deposit(dec!(0.001), &dollars).await.unwrap();
    assert_eq!(account.balance(&dollars).await.unwrap(), dec!(0.02));
}

#[tokio::test]
async fn test_bank_membership() {
    let economy = economy();
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let bank = economy
        .create_bank_account(Uuid::new_v4(), owner, Some("guild".to_string()))
        .await
        .unwrap();

    bank.add_bank_member(member).await.unwrap();
    bank.add_bank_member(member).await.unwrap();
    assert_eq!(bank.bank_member_ids().await.unwrap(), vec![member]);

    bank.remove_bank_member(stranger).await.unwrap();
    assert_eq!(bank.bank_member_ids().await.unwrap(), vec![member]);

    assert!(bank.is_bank_owner(owner));
    assert!(!bank.is_bank_owner(member));
    assert!(!bank.is_bank_member(owner).await.unwrap());
    assert!(bank.is_bank_member(member).await.unwrap());

    assert!(bank.has_bank_access(owner).await.unwrap());
    assert!(bank.has_bank_access(member).await.unwrap());
    assert!(!bank.has_bank_access(stranger).await.unwrap());

    bank.remove_bank_member(member).await.unwrap();
    assert!(bank.bank_member_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bank_funds_through_account_view() {
    let economy = economy();
    let dollars = economy.primary_currency();
    let id = Uuid::new_v4();
    let bank = economy
        .create_bank_account(id, Uuid::new_v4(), None)
        .await
        .unwrap();

    let view: &dyn Account = bank.as_account();
    view.deposit(dec!(12.345), &dollars).await.unwrap();
    assert_eq!(bank.balance(&dollars).await.unwrap(), dec!(12.35));
    assert_eq!(view.id(), id);

    assert!(economy.delete_bank_account(id).await.unwrap());
    assert_eq!(
        bank.add_bank_member(Uuid::new_v4()).await.unwrap_err(),
        EconomyError::account_not_found(id)
    );
}

#[tokio::test]
async fn test_bank_ids_and_accounts_ids_are_separate() {
    let economy = economy();
    let player = Uuid::new_v4();
    let bank = Uuid::new_v4();
    economy.create_account(player, None).await.unwrap();
    economy.create_bank_account(bank, player, None).await.unwrap();

    assert_eq!(economy.account_ids().await.unwrap(), vec![player]);
    assert_eq!(economy.bank_account_ids().await.unwrap(), vec![bank]);
}

#[test]
fn test_currency_conversion_through_primary() {
    let currencies = currencies();
    let (dollars, tokens) = (&currencies[0], &currencies[1]);
    assert_eq!(tokens.convert(dec!(250), dollars), Some(dec!(2.50)));
    assert_eq!(dollars.convert(dec!(1.5), tokens), Some(dec!(150)));
}
