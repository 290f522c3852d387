//! Error types for the ledger core.

use thiserror::Error;

/// Failures decoding or using key/signature material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("invalid hex encoding in {0}")]
    InvalidHex(&'static str),

    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("invalid DER signature")]
    InvalidSignature,

    #[error("digest must be 32 bytes")]
    InvalidDigest,
}

/// Lifecycle violations on a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction {0} is already approved")]
    AlreadyApproved(String),
}

/// A transaction refused at mempool admission. The ledger is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("transaction amount can't be zero or negative (got {0})")]
    NonPositiveAmount(i64),

    #[error("insufficient balance in {address}: has {available}, needs {requested}")]
    InsufficientBalance {
        address: String,
        available: i128,
        requested: i64,
    },

    #[error("transaction {0} is not pending")]
    NotPending(String),
}

/// Failures while constructing or sealing a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("block holds {len} transactions, capacity is {capacity}")]
    CapacityExceeded { len: usize, capacity: usize },

    #[error("no hash met difficulty {difficulty} after {attempts} attempts")]
    MiningTimeout { difficulty: u32, attempts: u64 },

    #[error("difficulty {difficulty} exceeds the {max} characters of a block hash")]
    UnreachableDifficulty { difficulty: u32, max: u32 },
}

/// Top-level error type for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("admission rejected: {0}")]
    Admission(#[from] AdmissionError),

    /// Stored hash no longer matches the block contents. Not auto-recoverable.
    #[error("block {index} was altered after sealing; switch to a known-good backup")]
    TamperFault { index: usize },

    /// Linkage between `index - 1` and `index` is broken. Recovered by truncation.
    #[error("block {index} does not link to its predecessor")]
    SequenceFault { index: usize },

    #[error("block error: {0}")]
    Block(#[from] BlockError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),
}

/// Errors from saving or loading ledger snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot rejected: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
