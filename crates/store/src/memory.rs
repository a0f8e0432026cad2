use crate::StateStore;
use crate::blobs::AccountSnapshot;
use crate::error::StoreError;
use async_trait::async_trait;
use core_types::TradeRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// An in-memory `StateStore` for tests and ephemeral runs.
///
/// Writes can be made to fail on demand with `fail_writes`, which the engine
/// tests use to verify that a persistence failure rolls the account back to
/// its pre-trade state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledgers: RwLock<HashMap<String, Vec<TradeRecord>>>,
    snapshots: RwLock<HashMap<String, AccountSnapshot>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `replace_*` call fails with `StoreError::Write`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_ledger(&self, account_id: &str) -> Result<Option<Vec<TradeRecord>>, StoreError> {
        Ok(self.ledgers.read().await.get(account_id).cloned())
    }

    async fn replace_ledger(
        &self,
        account_id: &str,
        trades: &[TradeRecord],
    ) -> Result<(), StoreError> {
        self.check_writable(&crate::blobs::ledger_key(account_id))?;
        self.ledgers
            .write()
            .await
            .insert(account_id.to_string(), trades.to_vec());
        Ok(())
    }

    async fn load_snapshot(
        &self,
        account_id: &str,
    ) -> Result<Option<AccountSnapshot>, StoreError> {
        Ok(self.snapshots.read().await.get(account_id).cloned())
    }

    async fn replace_snapshot(
        &self,
        account_id: &str,
        snapshot: &AccountSnapshot,
    ) -> Result<(), StoreError> {
        self.check_writable(&crate::blobs::snapshot_key(account_id))?;
        self.snapshots
            .write()
            .await
            .insert(account_id.to_string(), snapshot.clone());
        Ok(())
    }
}
