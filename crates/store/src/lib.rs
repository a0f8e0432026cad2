//! # Tally Store Crate
//!
//! This crate is the durable home of an account's trading state. It persists
//! two keyed blobs per account: the append-only trade ledger
//! (`ledger_<accountId>`, the source of truth in local deployments) and the
//! derived position/cash snapshot (`positions_<accountId>`, a cache).
//!
//! ## Architectural Principles
//!
//! - **Keyed Blobs, Not Tables:** The persistence contract the engine needs is
//!   get/set/atomic-replace keyed by account id. The `StateStore` trait
//!   expresses exactly that, so the backing medium (files here, a database or
//!   browser storage elsewhere) stays swappable.
//! - **Versioned Format:** Every blob carries an explicit format version and
//!   the owning account id. Unknown versions and mismatched accounts are hard
//!   errors, never silently reinterpreted.
//! - **Atomic Replace:** The file-backed implementation writes to a temp file
//!   and renames it into place, so readers never observe a half-written blob.
//!
//! ## Public API
//!
//! - `StateStore`: the async trait the engine persists through.
//! - `JsonFileStore`: one JSON file per blob under a data directory.
//! - `MemoryStore`: an in-memory implementation for tests, with an injectable
//!   write-failure mode for rollback testing.
//! - `StoreError`: the specific error types that can be returned from this crate.

pub mod blobs;
pub mod error;
pub mod file;
pub mod memory;

use async_trait::async_trait;
use core_types::TradeRecord;

// Re-export the key components to create a clean, public-facing API.
pub use blobs::{AccountSnapshot, STATE_FORMAT_VERSION, StoredLedger, StoredSnapshot};
pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// The abstract interface to durable account state.
///
/// Implementations must make `replace_*` atomic per key: a concurrent or
/// crashed reader sees either the previous blob or the new one, never a mix.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the full trade ledger for an account, oldest first.
    /// Returns `None` when the account has never been persisted.
    async fn load_ledger(&self, account_id: &str) -> Result<Option<Vec<TradeRecord>>, StoreError>;

    /// Atomically replaces the ledger blob for an account.
    async fn replace_ledger(
        &self,
        account_id: &str,
        trades: &[TradeRecord],
    ) -> Result<(), StoreError>;

    /// Loads the cached position/cash snapshot for an account.
    async fn load_snapshot(&self, account_id: &str)
    -> Result<Option<AccountSnapshot>, StoreError>;

    /// Atomically replaces the snapshot blob for an account.
    async fn replace_snapshot(
        &self,
        account_id: &str,
        snapshot: &AccountSnapshot,
    ) -> Result<(), StoreError>;
}
