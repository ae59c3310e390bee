//! In-memory ledger store
//!
//! Keeps the latest snapshot of every account in a concurrent map. An optional
//! artificial latency makes every write suspend, which is how tests and the
//! benchmark exercise interleaving against a store that behaves like a real
//! database round-trip.

use crate::core::traits::LedgerStore;
use crate::types::{AccountId, AccountKind, AccountSnapshot, EconomyError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

/// Ledger store backed by a `DashMap`
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    snapshots: DashMap<(AccountKind, AccountId), AccountSnapshot>,
    latency: Option<Duration>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that sleeps for `latency` before every write
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            snapshots: DashMap::new(),
            latency: Some(latency),
        }
    }

    /// Latest persisted snapshot of an account
    pub fn snapshot(&self, kind: AccountKind, id: AccountId) -> Option<AccountSnapshot> {
        self.snapshots.get(&(kind, id)).map(|entry| entry.clone())
    }

    /// Number of persisted accounts
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn save(&self, snapshot: &AccountSnapshot) -> Result<(), EconomyError> {
        self.delay().await;
        self.snapshots
            .insert((snapshot.kind, snapshot.id), snapshot.clone());
        Ok(())
    }

    async fn remove(&self, kind: AccountKind, id: AccountId) -> Result<(), EconomyError> {
        self.delay().await;
        self.snapshots.remove(&(kind, id));
        Ok(())
    }
}
