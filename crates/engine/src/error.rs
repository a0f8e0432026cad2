use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Validation turned the trade away. No state was touched.
    #[error("Trade rejected: {0}")]
    Rejected(#[from] risk::Rejection),

    /// Another submission currently holds the account. The caller may retry
    /// once the in-flight trade settles.
    #[error("Another trade is already in flight for this account")]
    TradeInFlight,

    /// The external trade log failed or timed out. The trade did not happen
    /// and local state is unchanged.
    #[error("External trade log failure: {0}")]
    External(#[from] chain_client::ChainError),

    /// The durable store could not be written. The in-memory account was left
    /// at its pre-trade state; the attempt can be retried.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] store::StoreError),

    /// Replaying a ledger produced an inconsistency (e.g., a sell with no
    /// matching holding). Points at a corrupt or foreign ledger blob.
    #[error("Ledger replay failed: {0}")]
    Ledger(#[from] portfolio::PortfolioError),

    #[error("Invalid trade: {0}")]
    InvalidTrade(#[from] core_types::CoreError),
}
