use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a proposed trade was turned away before execution. Each variant
/// carries the quantitative detail a caller needs to redisplay the form,
/// mirroring the shortfall/held-quantity messages of the validator contract.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient funds: trade costs {required} but only {available} is available (short {shortfall})")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    #[error("You do not own any shares of {symbol}")]
    NoPosition { symbol: String },

    #[error("You only own {held} shares of {symbol}, cannot sell {requested}")]
    InsufficientShares {
        symbol: String,
        requested: u64,
        held: u64,
    },
}
