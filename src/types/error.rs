//! Error types for the economy registry
//!
//! This module defines every error an economy provider or the registry helpers
//! can report. Errors travel through the asynchronous result of the operation
//! that produced them and never leave an account partially mutated.
//!
//! # Error Categories
//!
//! - **Resolution Errors**: no provider registered for a capability
//! - **Ledger Errors**: insufficient funds, invalid amounts, overflow
//! - **Catalog Errors**: unknown, duplicate or malformed currencies
//! - **Account Errors**: missing or duplicate accounts
//! - **Storage Errors**: the provider's persistence layer failed

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for economy operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EconomyError {
    /// No implementation is registered for the requested capability
    #[error("No {capability} is registered")]
    ProviderUnavailable {
        /// Name of the capability that could not be resolved
        capability: String,
    },

    /// A withdrawal would drive the balance negative without provider support
    #[error(
        "Insufficient funds in account {account}: balance {balance} {currency}, requested {requested}"
    )]
    InsufficientFunds {
        account: Uuid,
        currency: String,
        /// Exact stored balance, before rounding
        balance: Decimal,
        requested: Decimal,
    },

    /// The provider does not recognize the currency identifier
    #[error("Unknown currency '{identifier}'")]
    UnknownCurrency { identifier: String },

    /// A negative amount was passed where a non-negative one is required
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount { amount: Decimal, operation: String },

    /// No account with this id exists (or it has been deleted)
    #[error("Account {account} not found")]
    AccountNotFound { account: Uuid },

    /// An account with this id already exists
    #[error("Account {account} already exists")]
    AccountAlreadyExists { account: Uuid },

    /// Two currencies share an identifier within one provider
    #[error("Currency '{identifier}' is registered more than once")]
    DuplicateCurrency { identifier: String },

    /// A provider must declare exactly one primary currency
    #[error("Expected exactly one primary currency, found {count}")]
    PrimaryCurrency { count: usize },

    /// A currency definition violates its own invariants
    #[error("Invalid currency '{identifier}': {reason}")]
    InvalidCurrency { identifier: String, reason: String },

    /// Balance arithmetic left the representable range
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow { operation: String, account: Uuid },

    /// The provider's persistence layer rejected a write
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// The task running an accepted operation terminated abnormally
    #[error("Operation aborted: {message}")]
    OperationAborted { message: String },
}

// Helper functions for creating common errors

impl EconomyError {
    /// Create a ProviderUnavailable error
    pub fn provider_unavailable(capability: &str) -> Self {
        EconomyError::ProviderUnavailable {
            capability: capability.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(
        account: Uuid,
        currency: &str,
        balance: Decimal,
        requested: Decimal,
    ) -> Self {
        EconomyError::InsufficientFunds {
            account,
            currency: currency.to_string(),
            balance,
            requested,
        }
    }

    /// Create an UnknownCurrency error
    pub fn unknown_currency(identifier: &str) -> Self {
        EconomyError::UnknownCurrency {
            identifier: identifier.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, operation: &str) -> Self {
        EconomyError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: Uuid) -> Self {
        EconomyError::AccountNotFound { account }
    }

    /// Create an AccountAlreadyExists error
    pub fn account_already_exists(account: Uuid) -> Self {
        EconomyError::AccountAlreadyExists { account }
    }

    /// Create a DuplicateCurrency error
    pub fn duplicate_currency(identifier: &str) -> Self {
        EconomyError::DuplicateCurrency {
            identifier: identifier.to_string(),
        }
    }

    /// Create an InvalidCurrency error
    pub fn invalid_currency(identifier: &str, reason: &str) -> Self {
        EconomyError::InvalidCurrency {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: Uuid) -> Self {
        EconomyError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        EconomyError::Storage {
            message: message.into(),
        }
    }

    /// Create an OperationAborted error
    pub fn operation_aborted(message: impl Into<String>) -> Self {
        EconomyError::OperationAborted {
            message: message.into(),
        }
    }
}
