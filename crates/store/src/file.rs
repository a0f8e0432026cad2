use crate::blobs::{
    AccountSnapshot, STATE_FORMAT_VERSION, StoredLedger, StoredSnapshot, ledger_key, snapshot_key,
};
use crate::error::StoreError;
use crate::StateStore;
use async_trait::async_trait;
use core_types::TradeRecord;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// A `StateStore` that keeps one pretty-printed JSON file per blob under a
/// data directory. Writes go to a `.tmp` sibling first and are renamed into
/// place, which is atomic on the filesystems we care about.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    async fn read_blob<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.blob_path(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    key: key.to_string(),
                    source: e,
                });
            }
        };

        let blob = serde_json::from_slice(&raw).map_err(|e| StoreError::Decode {
            key: key.to_string(),
            source: e,
        })?;
        Ok(Some(blob))
    }

    async fn write_blob<T: Serialize>(&self, key: &str, blob: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(blob).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            source: e,
        })?;

        let io_err = |e: std::io::Error| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(io_err)?;

        let path = self.blob_path(key);
        let tmp_path = self.data_dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp_path, &encoded).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(io_err)?;

        tracing::debug!(key, bytes = encoded.len(), "replaced state blob");
        Ok(())
    }

    fn check_header(
        key: &str,
        account_id: &str,
        version: u32,
        found_account: &str,
    ) -> Result<(), StoreError> {
        if version != STATE_FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                key: key.to_string(),
                found: version,
                expected: STATE_FORMAT_VERSION,
            });
        }
        if found_account != account_id {
            return Err(StoreError::AccountMismatch {
                key: key.to_string(),
                found: found_account.to_string(),
                expected: account_id.to_string(),
            });
        }
        Ok(())
    }

    /// The directory this store writes into.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_ledger(&self, account_id: &str) -> Result<Option<Vec<TradeRecord>>, StoreError> {
        let key = ledger_key(account_id);
        match self.read_blob::<StoredLedger>(&key).await? {
            Some(blob) => {
                Self::check_header(&key, account_id, blob.version, &blob.account_id)?;
                Ok(Some(blob.trades))
            }
            None => Ok(None),
        }
    }

    async fn replace_ledger(
        &self,
        account_id: &str,
        trades: &[TradeRecord],
    ) -> Result<(), StoreError> {
        let blob = StoredLedger {
            version: STATE_FORMAT_VERSION,
            account_id: account_id.to_string(),
            trades: trades.to_vec(),
        };
        self.write_blob(&ledger_key(account_id), &blob).await
    }

    async fn load_snapshot(
        &self,
        account_id: &str,
    ) -> Result<Option<AccountSnapshot>, StoreError> {
        let key = snapshot_key(account_id);
        match self.read_blob::<StoredSnapshot>(&key).await? {
            Some(blob) => {
                Self::check_header(&key, account_id, blob.version, &blob.account_id)?;
                Ok(Some(blob.snapshot))
            }
            None => Ok(None),
        }
    }

    async fn replace_snapshot(
        &self,
        account_id: &str,
        snapshot: &AccountSnapshot,
    ) -> Result<(), StoreError> {
        let blob = StoredSnapshot {
            version: STATE_FORMAT_VERSION,
            account_id: account_id.to_string(),
            snapshot: snapshot.clone(),
        };
        self.write_blob(&snapshot_key(account_id), &blob).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{TradeRecord, TradeSide};
    use rust_decimal::Decimal;

    fn scratch_store() -> JsonFileStore {
        let dir = std::env::temp_dir()
            .join("tally-store-tests")
            .join(uuid::Uuid::new_v4().to_string());
        JsonFileStore::new(dir)
    }

    fn trade(symbol: &str, qty: u64, price: i64) -> TradeRecord {
        TradeRecord::new(symbol, TradeSide::Buy, qty, Decimal::from(price)).unwrap()
    }

    #[tokio::test]
    async fn missing_account_loads_as_none() {
        let store = scratch_store();
        assert!(store.load_ledger("nobody").await.unwrap().is_none());
        assert!(store.load_snapshot("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_ledger_overwrites_previous_blob() {
        let store = scratch_store();

        store
            .replace_ledger("alice", &[trade("AAPL", 10, 150)])
            .await
            .unwrap();
        store
            .replace_ledger("alice", &[trade("AAPL", 10, 150), trade("MSFT", 5, 300)])
            .await
            .unwrap();

        let ledger = store.load_ledger("alice").await.unwrap().unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[1].symbol, "MSFT");
    }

    #[tokio::test]
    async fn accounts_are_isolated_by_key() {
        let store = scratch_store();

        store
            .replace_ledger("alice", &[trade("AAPL", 1, 100)])
            .await
            .unwrap();

        assert!(store.load_ledger("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unsupported_version_is_rejected() {
        let store = scratch_store();
        store
            .replace_ledger("alice", &[trade("AAPL", 1, 100)])
            .await
            .unwrap();

        // Rewrite the blob with a future format version.
        let path = store.blob_path("ledger_alice");
        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let bumped = raw.replace("\"version\": 1", "\"version\": 99");
        tokio::fs::write(&path, bumped).await.unwrap();

        match store.load_ledger("alice").await {
            Err(StoreError::UnsupportedVersion { found, .. }) => assert_eq!(found, 99),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }
}
