use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read state blob '{key}': {source}")]
    Read {
        key: String,
        source: std::io::Error,
    },

    #[error("Failed to write state blob '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("Failed to decode state blob '{key}': {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },

    #[error("Failed to encode state blob '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },

    #[error("State blob '{key}' has unsupported format version {found} (this build reads version {expected})")]
    UnsupportedVersion {
        key: String,
        found: u32,
        expected: u32,
    },

    #[error("State blob '{key}' belongs to account '{found}', expected '{expected}'")]
    AccountMismatch {
        key: String,
        found: String,
        expected: String,
    },
}
