//! # Tally Risk Crate
//!
//! Pre-flight validation for proposed trades: funds sufficiency on buys,
//! share sufficiency on sells, input sanity before any state is read. The
//! validator is deliberately pure so rejection can never leave the account in
//! a half-updated state.

// Declare the modules that constitute this crate.
pub mod error;
pub mod validator;

// Re-export the key components to provide a clean, public-facing API.
pub use error::Rejection;
pub use validator::TradeValidator;
