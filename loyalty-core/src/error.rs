//! Error types for the loyalty ledger

use crate::types::CustomerId;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Loyalty ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing input, rejected before any store access
    #[error("Validation error: {0}")]
    Validation(String),

    /// No loyalty account exists for the customer
    #[error("Loyalty account not found: {0}")]
    AccountNotFound(CustomerId),

    /// No customer record exists for the identifier
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// No account carries the supplied referral code
    #[error("Invalid referral code: {0}")]
    ReferralCodeNotFound(String),

    /// A customer with this identifier already exists
    #[error("Customer already exists: {0}")]
    CustomerExists(CustomerId),

    /// Referral code already assigned to another account
    #[error("Referral code already in use: {0}")]
    DuplicateReferralCode(String),

    /// Redemption exceeds the available balance
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Points the caller tried to redeem
        requested: i64,
        /// Points actually available
        available: i64,
    },

    /// A customer applied their own referral code
    #[error("Cannot refer yourself")]
    SelfReferral,

    /// Optimistic transaction retry budget exhausted
    #[error("Transaction conflict persisted after {attempts} attempts")]
    TransactionConflict {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Backing store unreachable or misconfigured
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal error
    #[error("{0}")]
    Internal(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
