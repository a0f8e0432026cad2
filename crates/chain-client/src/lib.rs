//! # Tally Chain Client Crate
//!
//! The boundary to an external, authoritative trade log (in the original
//! deployment, a smart contract behind a wallet provider). The rest of the
//! system only sees the `TradeLog` trait: an ordered history that can be
//! fetched in full, and a write path that may be slow, may time out, and may
//! fail independently of local validation.
//!
//! ## Architectural Principles
//!
//! - **Adapter, Not Authority Logic:** This crate normalizes wire records into
//!   `TradeRecord`s and surfaces failures as typed errors. Deciding what a
//!   failure means for local state is the engine's job.
//! - **Lossless Money On The Wire:** Prices are decimal strings in both
//!   directions; nothing here touches binary floating point.
//!
//! ## Public API
//!
//! - `TradeLog`: the abstract interface to an external trade log.
//! - `HttpTradeLog`: the reqwest-backed client for a remote log service.
//! - `MockTradeLog`: an in-memory log with an injectable failure mode, for tests.
//! - `ChainError`: the specific error types that can be returned from this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{TradeRecord, TradeSide};
use rust_decimal::Decimal;
use uuid::Uuid;

pub mod error;
pub mod http;
pub mod mock;
pub mod responses;

// Re-export the key components to provide a clean, public-facing API.
pub use error::ChainError;
pub use http::HttpTradeLog;
pub use mock::MockTradeLog;
pub use responses::{RecordTradeRequest, RecordTradeResponse, TradesResponse, WireTrade};

/// The local id for an externally recorded trade, derived deterministically
/// from the log's own reference. The same `tx_ref` always maps to the same
/// id, so refetching an unchanged history yields byte-identical records and
/// a confirmed trade can be found again in a later fetch.
pub fn trade_id_for_tx_ref(tx_ref: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, tx_ref.as_bytes())
}

/// Confirmation that the external log durably recorded a trade.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReceipt {
    /// The log's reference for the recorded trade (e.g., a transaction hash).
    pub tx_ref: String,
    pub recorded_at: DateTime<Utc>,
}

/// The generic, abstract interface to an external trade log.
///
/// When a deployment has one of these, it is the source of truth: the local
/// ledger becomes a cache that is rebuilt from `fetch_trades` after every
/// confirmed write and on demand.
#[async_trait]
pub trait TradeLog: Send + Sync {
    /// Fetches the full trade history for an account, oldest first, in the
    /// order the log executed them.
    async fn fetch_trades(&self, account_ref: &str) -> Result<Vec<TradeRecord>, ChainError>;

    /// Records a trade against the external log. Returns only once the log
    /// has durably accepted it; any error means the trade did not happen.
    async fn record_trade(
        &self,
        account_ref: &str,
        side: TradeSide,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<ChainReceipt, ChainError>;
}
