use crate::error::ChainError;
use crate::{ChainReceipt, TradeLog, trade_id_for_tx_ref};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{TradeRecord, TradeSide};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// An in-memory `TradeLog` for tests and offline development.
///
/// Behaves like the real log: `record_trade` appends to the per-account
/// history and `fetch_trades` returns that history in execution order.
/// `fail_writes` makes writes fail, which the engine tests use to verify
/// external-failure isolation.
#[derive(Debug, Default)]
pub struct MockTradeLog {
    histories: Mutex<HashMap<String, Vec<TradeRecord>>>,
    fail_writes: AtomicBool,
    tx_counter: AtomicU64,
}

impl MockTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `record_trade` call fails with `ChainError::Rejected`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Preloads history for an account, as if the trades were recorded
    /// before this process started.
    pub async fn seed(&self, account_ref: &str, trades: Vec<TradeRecord>) {
        self.histories
            .lock()
            .await
            .insert(account_ref.to_string(), trades);
    }

    /// Number of trades currently recorded for an account.
    pub async fn recorded_count(&self, account_ref: &str) -> usize {
        self.histories
            .lock()
            .await
            .get(account_ref)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl TradeLog for MockTradeLog {
    async fn fetch_trades(&self, account_ref: &str) -> Result<Vec<TradeRecord>, ChainError> {
        Ok(self
            .histories
            .lock()
            .await
            .get(account_ref)
            .cloned()
            .unwrap_or_default())
    }

    async fn record_trade(
        &self,
        account_ref: &str,
        side: TradeSide,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<ChainReceipt, ChainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChainError::Rejected(
                "injected failure: transaction reverted".to_string(),
            ));
        }

        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let tx_ref = format!("mock-tx-{n:08x}");
        let recorded_at = Utc::now();

        // Same id derivation as the real client, so a recorded trade is
        // recognizable in a later fetch by its receipt.
        let trade = TradeRecord::with_metadata(
            symbol,
            side,
            quantity,
            price,
            trade_id_for_tx_ref(&tx_ref),
            recorded_at,
        )
        .map_err(|e| ChainError::InvalidData(e.to_string()))?;

        self.histories
            .lock()
            .await
            .entry(account_ref.to_string())
            .or_default()
            .push(trade);

        Ok(ChainReceipt { tx_ref, recorded_at })
    }
}
