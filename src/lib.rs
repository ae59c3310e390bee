//! Economy Registry Library
//! # Overview
//!
//! This library lets independently written economy providers plug into a host
//! and lets consumer code use whichever provider is active without depending on
//! it directly.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Value types (Currency, features, priorities, errors, events)
//! - [`config`] - Provider and replay configuration
//! - [`core`] - Registry and economy contract:
//!   - [`core::registry`] - Capability-keyed, priority-ordered service registry
//!   - [`core::traits`] - `Account`, `BankAccount`, `EconomyProvider`, `LedgerStore`
//!   - [`core::economy`] - Resolving the active economy provider
//!   - [`core::memory`] - In-memory reference provider
//! - [`io`] - Journal parsing and balance output
//! - [`replay`] - Journal replay against a registry-resolved provider
//! - [`cli`] / [`logging`] - Binary plumbing
//!
//! # Resolution
//!
//! Providers register with a [`ServicePriority`]. The active provider for a
//! capability is the one with the highest priority; among equals, the earliest
//! registration wins. Unregistering the active provider promotes the next one.
//!
//! # Accounts
//!
//! Every account operation is asynchronous. Operations on one account apply
//! one at a time in call order, each all-or-nothing; different accounts
//! proceed concurrently. Amounts returned are rounded half-up to the currency
//! precision.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod types;

pub use config::{CurrencyLookup, ProviderConfig, ReplayConfig};
pub use crate::core::{
    active_economy, register_economy, Account, BankAccount, EconomyProvider, EconomyService,
    EconomySummary, LedgerStore, MemoryEconomy, MemoryLedgerStore, RegistrationHandle, Service,
    ServiceRegistry,
};
pub use io::write_balances_csv;
pub use replay::{ReplayReport, Replayer};
pub use types::{
    AccountId, AccountKind, AccountSnapshot, Currency, EconomyError, FeatureSet,
    OptionalEconomyApiFeature, PlayerId, ServicePriority, TransactionEvent, TransactionKind,
};
