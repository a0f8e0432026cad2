use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub account: AccountSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub chain: ChainSettings,
}

/// Identifies the account the engine operates on. In a larger deployment this
/// would come from an authentication/session service; here the session
/// collaborator is the config file itself.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSettings {
    /// The account the ledger and positions are keyed by.
    pub account_id: String,
    /// The cash balance the account starts with before any trades.
    pub starting_cash: Decimal,
}

/// Where the durable ledger and position blobs live.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Directory for the JSON-file-backed state store.
    pub data_dir: String,
}

/// Settings for the external trade log adapter. When `enabled` is false, the
/// local ledger is the source of truth and no network calls are made.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    pub enabled: bool,
    /// Base URL of the trade-log service.
    pub endpoint: String,
    /// The on-chain account reference (e.g., a wallet address) trades are
    /// recorded against. Falls back to `account.account_id` when empty.
    #[serde(default)]
    pub account_ref: String,
    /// How long to wait for an external confirmation before treating the
    /// trade as failed.
    pub confirm_timeout_secs: u64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            account_ref: String::new(),
            confirm_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Sanity-checks values that the type system cannot express.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        if self.account.account_id.trim().is_empty() {
            return Err(crate::error::ConfigError::ValidationError(
                "account.account_id must not be empty".to_string(),
            ));
        }
        if self.account.starting_cash < Decimal::ZERO {
            return Err(crate::error::ConfigError::ValidationError(
                "account.starting_cash must not be negative".to_string(),
            ));
        }
        if self.chain.enabled && self.chain.endpoint.trim().is_empty() {
            return Err(crate::error::ConfigError::ValidationError(
                "chain.endpoint must be set when chain.enabled = true".to_string(),
            ));
        }
        Ok(())
    }
}
