use core_types::{Position, TradeRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The on-disk format version this build reads and writes. Bump when the
/// blob layout changes; older blobs are rejected explicitly rather than
/// reinterpreted.
pub const STATE_FORMAT_VERSION: u32 = 1;

/// The derived account state persisted alongside the ledger. This is a cache:
/// it must always equal what a full replay of the ledger produces, and the
/// engine recomputes it whenever the two disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub cash: Decimal,
    pub positions: Vec<Position>,
}

/// Wire format for the `ledger_<accountId>` blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLedger {
    pub version: u32,
    pub account_id: String,
    pub trades: Vec<TradeRecord>,
}

/// Wire format for the `positions_<accountId>` blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub version: u32,
    pub account_id: String,
    pub snapshot: AccountSnapshot,
}

/// The key under which an account's ledger blob is stored.
pub fn ledger_key(account_id: &str) -> String {
    format!("ledger_{account_id}")
}

/// The key under which an account's cached snapshot blob is stored.
pub fn snapshot_key(account_id: &str) -> String {
    format!("positions_{account_id}")
}
