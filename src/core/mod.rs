//! Core registry and economy module
//!
//! This module contains the service registry and the economy contract:
//! - `registry` - Capability-keyed, priority-ordered service directory
//! - `traits` - The `Account`, `BankAccount`, `EconomyProvider` and
//!   `LedgerStore` contracts
//! - `economy` - Helpers resolving the active economy provider
//! - `catalog` - Validated currency set of a provider
//! - `ledger` - Balance and membership rules of a single account
//! - `memory` - In-memory reference provider

pub mod catalog;
pub mod economy;
pub mod ledger;
pub mod memory;
pub mod registry;
pub mod traits;

pub use catalog::CurrencyCatalog;
pub use economy::{active_economy, register_economy, EconomyService, EconomySummary};
pub use ledger::Ledger;
pub use memory::{MemoryEconomy, MemoryLedgerStore};
pub use registry::{RegistrationHandle, Service, ServiceRegistry};
pub use traits::{Account, BankAccount, EconomyProvider, LedgerStore};
