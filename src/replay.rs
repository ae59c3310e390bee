//! Journal replay against a registry-resolved economy provider
//!
//! The replayer builds an in-memory provider from a [`ReplayConfig`],
//! registers it into a private [`ServiceRegistry`], and resolves it back
//! through the registry like any consumer would. The journal is then
//! partitioned by account: each account's records run sequentially in journal
//! order on their own task, while different accounts replay concurrently.
//!
//! # Architecture
//!
//! ```text
//! Replayer
//!     ├── ReplayConfig (provider flags, currencies, worker threads)
//!     ├── OperationReader (streaming CSV journal)
//!     ├── ServiceRegistry ── MemoryEconomy (resolved as dyn EconomyProvider)
//!     └── write_balances_csv (final balances)
//! ```
//!
//! # Error Handling
//!
//! Fatal errors (unreadable file, invalid configuration, runtime failure) are
//! returned. Malformed journal rows and rejected operations are logged and
//! counted, and the replay continues.

use crate::config::ReplayConfig;
use crate::core::economy::{active_economy, register_economy, EconomyService, EconomySummary};
use crate::core::memory::MemoryEconomy;
use crate::core::registry::ServiceRegistry;
use crate::core::traits::{Account, EconomyProvider};
use crate::io::{write_balances_csv, BalanceRow, OperationReader};
use crate::types::{
    AccountId, AccountKind, Currency, EconomyError, Operation, OperationRecord, ServicePriority,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, trace, warn};

/// Registrar name the replay provider registers under
pub const REPLAY_REGISTRAR: &str = "economy-replay";

/// Counts of what happened to the journal's rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Records the provider accepted
    pub applied: usize,
    /// Well-formed records the provider refused
    pub rejected: usize,
    /// Rows that could not be parsed
    pub malformed: usize,
}

impl ReplayReport {
    fn merge(&mut self, other: ReplayReport) {
        self.applied += other.applied;
        self.rejected += other.rejected;
        self.malformed += other.malformed;
    }
}

/// Replays journals with a fixed configuration
#[derive(Debug, Clone)]
pub struct Replayer {
    config: ReplayConfig,
}

impl Replayer {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Replay a journal file and write the resulting balances
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the CSV journal
    /// * `output` - Writer receiving the balance CSV
    ///
    /// # Returns
    ///
    /// * `Ok(ReplayReport)` if the journal was replayed
    /// * `Err(String)` if a fatal error occurred
    pub fn replay(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplayReport, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent.max(1))
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(self.run(input_path, output))
    }

    async fn run(&self, input_path: &Path, output: &mut dyn Write) -> Result<ReplayReport, String> {
        let provider = MemoryEconomy::new(&self.config.provider, self.config.currencies.clone())
            .map_err(|e| format!("Invalid economy configuration: {}", e))?;

        let registry = ServiceRegistry::new();
        register_economy(
            &registry,
            Arc::new(provider),
            ServicePriority::Normal,
            REPLAY_REGISTRAR,
        );
        let economy = active_economy(&registry).map_err(|e| e.to_string())?;
        let summary = EconomySummary::of(&economy);
        info!(%summary, "replaying journal");

        let listener = economy.subscribe_transactions().map(|mut events| {
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => trace!(
                            account = %event.account,
                            kind = ?event.kind,
                            currency = %event.currency,
                            amount = %event.amount,
                            balance = %event.balance,
                            "transaction committed"
                        ),
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "transaction listener lagged")
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        });

        let mut report = ReplayReport::default();
        let mut partitions: HashMap<AccountId, Vec<OperationRecord>> = HashMap::new();
        for result in OperationReader::new(input_path)? {
            match result {
                Ok(record) => partitions.entry(record.account).or_default().push(record),
                Err(e) => {
                    warn!(error = %e, "skipping malformed journal row");
                    report.malformed += 1;
                }
            }
        }

        let tasks: Vec<_> = partitions
            .into_values()
            .map(|records| {
                let economy = economy.clone();
                tokio::spawn(async move { replay_account(&economy, records).await })
            })
            .collect();

        for outcome in join_all(tasks).await {
            match outcome {
                Ok(account_report) => report.merge(account_report),
                Err(e) => error!(error = %e, "account replay task failed"),
            }
        }

        let rows = collect_balances(&economy)
            .await
            .map_err(|e| format!("Failed to read balances: {}", e))?;

        if let Some(listener) = listener {
            listener.abort();
        }
        drop(economy);
        registry.unregister_all(REPLAY_REGISTRAR);

        write_balances_csv(&rows, output)?;

        info!(
            applied = report.applied,
            rejected = report.rejected,
            malformed = report.malformed,
            "replay finished"
        );
        Ok(report)
    }
}

/// Apply one account's records in journal order
async fn replay_account(economy: &EconomyService, records: Vec<OperationRecord>) -> ReplayReport {
    let mut report = ReplayReport::default();
    for record in records {
        match apply_record(economy.get().as_ref(), &record).await {
            Ok(()) => {
                debug!(account = %record.account, op = ?record.op, "applied");
                report.applied += 1;
            }
            Err(e) => {
                warn!(account = %record.account, op = ?record.op, error = %e, "operation rejected");
                report.rejected += 1;
            }
        }
    }
    report
}

async fn apply_record(
    economy: &dyn EconomyProvider,
    record: &OperationRecord,
) -> Result<(), EconomyError> {
    // presence of currency, amount and player is checked when the row is parsed
    let player = record.player.unwrap_or_default();

    match record.op {
        Operation::Open => {
            economy.create_account(record.account, None).await?;
        }
        Operation::OpenBank => {
            economy
                .create_bank_account(record.account, player, None)
                .await?;
        }
        Operation::Deposit | Operation::Withdraw | Operation::SetBalance => {
            let identifier = record.currency.as_deref().unwrap_or_default();
            let currency = economy
                .find_currency(identifier)
                .ok_or_else(|| EconomyError::unknown_currency(identifier))?;
            let amount = record.amount.unwrap_or_default();

            // player accounts take precedence when both namespaces hold the id
            match economy.retrieve_account(record.account).await {
                Ok(account) => {
                    move_funds(account.as_ref(), record.op, amount, &currency).await?;
                }
                Err(EconomyError::AccountNotFound { .. }) => {
                    let bank = economy.retrieve_bank_account(record.account).await?;
                    move_funds(bank.as_account(), record.op, amount, &currency).await?;
                }
                Err(e) => return Err(e),
            }
        }
        Operation::AddMember => {
            let bank = economy.retrieve_bank_account(record.account).await?;
            bank.add_bank_member(player).await?;
        }
        Operation::RemoveMember => {
            let bank = economy.retrieve_bank_account(record.account).await?;
            bank.remove_bank_member(player).await?;
        }
    }
    Ok(())
}

async fn move_funds(
    account: &dyn Account,
    op: Operation,
    amount: Decimal,
    currency: &Currency,
) -> Result<Decimal, EconomyError> {
    match op {
        Operation::Withdraw => account.withdraw(amount, currency).await,
        Operation::SetBalance => account.set_balance(amount, currency).await,
        _ => account.deposit(amount, currency).await,
    }
}

/// One row per held currency of every account
///
/// An account holding nothing is reported once, at zero in the primary
/// currency, so every opened account appears in the output.
async fn collect_balances(economy: &EconomyService) -> Result<Vec<BalanceRow>, EconomyError> {
    let mut rows = Vec::new();

    for id in economy.account_ids().await? {
        let account = economy.retrieve_account(id).await?;
        rows.extend(balance_rows(economy, account.as_ref(), AccountKind::Player, None).await?);
    }

    for id in economy.bank_account_ids().await? {
        let bank = economy.retrieve_bank_account(id).await?;
        let members = bank.bank_member_ids().await?.len();
        rows.extend(balance_rows(economy, bank.as_account(), AccountKind::Bank, Some(members)).await?);
    }

    Ok(rows)
}

async fn balance_rows(
    economy: &EconomyService,
    account: &dyn Account,
    kind: AccountKind,
    members: Option<usize>,
) -> Result<Vec<BalanceRow>, EconomyError> {
    let mut held = account.held_currencies().await?;
    if held.is_empty() {
        held.push(economy.primary_currency().identifier().to_string());
    }

    let mut rows = Vec::with_capacity(held.len());
    for identifier in held {
        let currency = economy
            .find_currency(&identifier)
            .ok_or_else(|| EconomyError::unknown_currency(&identifier))?;
        rows.push(BalanceRow {
            account: account.id(),
            kind,
            currency: currency.identifier().to_string(),
            balance: account.balance(&currency).await?,
            precision: currency.decimal_precision(),
            members,
        });
    }
    Ok(rows)
}
