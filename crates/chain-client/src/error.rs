use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Failed to reach the trade log service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("The trade log rejected the request: {0}")]
    Rejected(String),

    #[error("Timed out after {0}s waiting for the trade log to confirm")]
    Timeout(u64),

    #[error("Failed to decode the trade log response: {0}")]
    Deserialization(String),

    #[error("Invalid trade data from the log: {0}")]
    InvalidData(String),
}
