//! Error types for spanmark.
//!
//! The engine deliberately has almost no failure surface: misaligned or
//! truncated annotations are tolerated and dropped during matching, and
//! conflicting spans are resolved by policy, never reported (see the
//! matcher and toggle modules). The only fatal conditions are the two
//! input boundaries: a token stream that violates the tokenizer contract,
//! and a portable record whose shape is malformed.

use thiserror::Error;

/// Result type for spanmark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for spanmark operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Token stream violates the tokenizer contract.
    #[error("Token stream contract violated: {0}")]
    Tokens(String),

    /// Portable annotation record is malformed.
    #[error("Invalid record: {0}")]
    Record(String),
}

impl Error {
    /// Create a token-stream contract error.
    pub fn tokens(msg: impl Into<String>) -> Self {
        Error::Tokens(msg.into())
    }

    /// Create a malformed-record error.
    pub fn record(msg: impl Into<String>) -> Self {
        Error::Record(msg.into())
    }
}
