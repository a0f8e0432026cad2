use core_types::{Position, TradeRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the engine hands back for a successfully executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// The ledger record the trade was committed as.
    pub trade: TradeRecord,
    /// Human-readable confirmation for display.
    pub message: String,
    /// Cash balance after the trade.
    pub cash_balance: Decimal,
    /// The resulting position in the traded symbol; `None` when the trade
    /// sold the holding down to zero.
    pub position: Option<Position>,
    /// Realized gain or loss, present on sells only.
    pub realized_pnl: Option<Decimal>,
    /// The external log's reference for the trade, when one recorded it.
    pub tx_ref: Option<String>,
}
