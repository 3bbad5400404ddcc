//! Error types for the trust ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Transaction rejected before reaching the mempool
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Chain structure rejected on import
    #[error("Invalid chain: {0}")]
    InvalidChain(String),

    /// Proof-of-work difficulty out of reach
    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),

    /// Serialization error (JSON)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
