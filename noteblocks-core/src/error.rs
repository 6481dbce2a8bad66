//! Error types for noteblocks-core
//!
//! Content decoding never fails and never touches these types; errors exist
//! only on the store and transaction side of the crate.

use thiserror::Error;

/// Result type alias for noteblocks-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// JSON parsing error
    #[error("JSON parsing failed: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pubkey that is not 64 hex characters
    #[error("Invalid pubkey: {0}")]
    InvalidPubkey(String),
}
