//! # Tally Portfolio Crate
//!
//! This crate owns the state of a trading account and the arithmetic that
//! derives positions from trades. It is the system's only place where cash,
//! ledger, and holdings change.
//!
//! ## Architectural Principles
//!
//! - **Ledger Is Truth:** The position map is a pure function of
//!   `(starting_cash, ledger)`. `Account::replay` is the authoritative
//!   derivation; `Account::apply_trade` is the incremental step and must agree
//!   with a full replay at every prefix.
//! - **Average-Cost Accounting:** Buys fold into a quantity-weighted average
//!   price; sells reduce quantity without touching the average and report the
//!   realized P&L to the caller instead of storing it.
//! - **No Partial Effects:** Every mutation either fully applies or leaves the
//!   account exactly as it was.
//!
//! ## Public API
//!
//! - `Account`: cash, positions, and the append-only ledger for one account.
//! - `apply_to_positions` / `compute_positions`: the incremental and full-replay
//!   position calculators.
//! - `PortfolioError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod account;
pub mod error;
pub mod replay;

// Re-export the key components to provide a clean, public-facing API.
pub use account::Account;
pub use error::PortfolioError;
pub use replay::{AVERAGE_PRICE_SCALE, apply_to_positions, compute_positions};
