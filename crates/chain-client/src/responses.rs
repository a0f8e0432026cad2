use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One trade as the log service reports it. Prices travel as decimal strings
/// end to end so no precision is lost to binary floating point on either side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTrade {
    pub symbol: String,
    pub is_buy: bool,
    pub quantity: u64,
    pub price: String,
    pub executed_at: DateTime<Utc>,
    /// The service's own reference for the recorded trade, when it has one.
    #[serde(default)]
    pub tx_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradesResponse {
    pub trades: Vec<WireTrade>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordTradeRequest {
    pub symbol: String,
    pub is_buy: bool,
    pub quantity: u64,
    pub price: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordTradeResponse {
    pub tx_ref: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogErrorResponse {
    pub error: String,
}
