use crate::error::ChainError;
use crate::responses::{
    LogErrorResponse, RecordTradeRequest, RecordTradeResponse, TradesResponse, WireTrade,
};
use crate::{ChainReceipt, TradeLog};
use async_trait::async_trait;
use core_types::{TradeRecord, TradeSide};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// A `TradeLog` backed by a remote HTTP trade-log service.
///
/// Endpoints:
/// - `GET  {base}/accounts/{account_ref}/trades` -> full history
/// - `POST {base}/accounts/{account_ref}/trades` -> record one trade
#[derive(Debug, Clone)]
pub struct HttpTradeLog {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpTradeLog {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    fn trades_url(&self, account_ref: &str) -> String {
        format!("{}/accounts/{}/trades", self.base_url, account_ref)
    }

    fn map_transport(&self, e: reqwest::Error) -> ChainError {
        if e.is_timeout() {
            ChainError::Timeout(self.timeout_secs)
        } else {
            ChainError::Transport(e)
        }
    }

    /// Normalizes one wire record into the ledger's event shape. Records that
    /// carry a `tx_ref` get a stable id derived from it, so refetches of an
    /// unchanged history produce identical records.
    fn normalize(wire: WireTrade) -> Result<TradeRecord, ChainError> {
        let price = Decimal::from_str(&wire.price)
            .map_err(|e| ChainError::InvalidData(format!("bad price '{}': {}", wire.price, e)))?;
        let side = if wire.is_buy {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        };
        let trade_id = match &wire.tx_ref {
            Some(tx_ref) => crate::trade_id_for_tx_ref(tx_ref),
            None => Uuid::new_v4(),
        };

        TradeRecord::with_metadata(
            &wire.symbol,
            side,
            wire.quantity,
            price,
            trade_id,
            wire.executed_at,
        )
        .map_err(|e| ChainError::InvalidData(e.to_string()))
    }

    async fn decode_error(response: reqwest::Response) -> ChainError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<LogErrorResponse>(&text) {
            Ok(body) => ChainError::Rejected(body.error),
            Err(_) => ChainError::Rejected(format!("HTTP {status}: {text}")),
        }
    }
}

#[async_trait]
impl TradeLog for HttpTradeLog {
    async fn fetch_trades(&self, account_ref: &str) -> Result<Vec<TradeRecord>, ChainError> {
        let response = self
            .client
            .get(self.trades_url(account_ref))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        let body: TradesResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Deserialization(e.to_string()))?;

        tracing::debug!(
            account_ref,
            trades = body.trades.len(),
            "fetched external trade history"
        );

        body.trades.into_iter().map(Self::normalize).collect()
    }

    async fn record_trade(
        &self,
        account_ref: &str,
        side: TradeSide,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<ChainReceipt, ChainError> {
        let request = RecordTradeRequest {
            symbol: symbol.to_uppercase(),
            is_buy: side == TradeSide::Buy,
            quantity,
            price: price.to_string(),
        };

        let response = self
            .client
            .post(self.trades_url(account_ref))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        let body: RecordTradeResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Deserialization(e.to_string()))?;

        tracing::info!(account_ref, symbol, %side, quantity, %price, tx_ref = %body.tx_ref,
            "external trade log confirmed trade");

        Ok(ChainReceipt {
            tx_ref: body.tx_ref,
            recorded_at: body.recorded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn wire(tx_ref: Option<&str>) -> WireTrade {
        WireTrade {
            symbol: "AAPL".to_string(),
            is_buy: true,
            quantity: 10,
            price: "150.25".to_string(),
            executed_at: Utc::now(),
            tx_ref: tx_ref.map(String::from),
        }
    }

    #[test]
    fn normalized_ids_are_stable_across_refetches() {
        let first = HttpTradeLog::normalize(wire(Some("0xfeed"))).unwrap();
        let second = HttpTradeLog::normalize(wire(Some("0xfeed"))).unwrap();
        assert_eq!(first.trade_id, second.trade_id);

        let other = HttpTradeLog::normalize(wire(Some("0xbeef"))).unwrap();
        assert_ne!(first.trade_id, other.trade_id);
    }

    #[test]
    fn records_without_a_tx_ref_still_get_an_id() {
        let first = HttpTradeLog::normalize(wire(None)).unwrap();
        let second = HttpTradeLog::normalize(wire(None)).unwrap();
        assert_ne!(first.trade_id, second.trade_id);
    }
}
