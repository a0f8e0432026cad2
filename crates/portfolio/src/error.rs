use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Not enough cash to apply trade. Required: {required}, Available: {available}")]
    InsufficientCash { required: String, available: String },

    #[error("No position held for symbol: {0}")]
    MissingPosition(String),

    #[error("Trade sells more shares than held for {symbol}. Requested: {requested}, Held: {held}")]
    Oversold {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("Arithmetic overflow while applying a trade for {0}")]
    Overflow(String),
}
