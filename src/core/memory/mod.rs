//! In-memory reference provider
//!
//! This module contains a complete implementation of the provider contract:
//! - `provider` - [`MemoryEconomy`], the `EconomyProvider` implementation
//! - `account` - Player and bank accounts with serialized mutation
//! - `store` - [`MemoryLedgerStore`], a `DashMap`-backed `LedgerStore`

mod account;
pub mod provider;
pub mod store;

pub use account::{MemoryAccount, MemoryBankAccount};
pub use provider::MemoryEconomy;
pub use store::MemoryLedgerStore;
