//! Types module
//!
//! Contains the value types shared by the registry, providers and the replay
//! tool. This module organizes types into logical submodules:
//! - `account`: Account identifiers and persisted snapshots
//! - `currency`: The immutable currency value
//! - `error`: Error types for economy operations
//! - `feature`: Optional features a provider advertises
//! - `operation`: Journal records for the replay tool
//! - `priority`: Registration priority tiers
//! - `transaction`: Transaction events

pub mod account;
pub mod currency;
pub mod error;
pub mod feature;
pub mod operation;
pub mod priority;
pub mod transaction;

pub use account::{AccountId, AccountKind, AccountSnapshot, PlayerId};
pub use currency::{Currency, MAX_DECIMAL_PRECISION};
pub use error::EconomyError;
pub use feature::{FeatureSet, OptionalEconomyApiFeature};
pub use operation::{Operation, OperationRecord};
pub use priority::ServicePriority;
pub use transaction::{TransactionEvent, TransactionKind};
