//! CRM Loyalty Ledger Core
//!
//! Per-customer loyalty accounts with invariant-preserving point operations.
//!
//! # Architecture
//!
//! - **Document model**: one versioned `LoyaltyAccount` per customer
//! - **Optimistic concurrency**: read-modify-write runs as a bounded
//!   compare-and-swap loop against the store's version counter
//! - **Blind increments**: referral bonuses are commutative deltas and skip
//!   the full transaction path
//!
//! # Invariants
//!
//! - `points >= 0` after every public operation
//! - `tier` is derived from `points` at accrual time, never set independently
//! - `referral_code` is unique across accounts and immutable
//! - Customer record and loyalty account are committed as one atomic batch

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod error;
pub mod ledger;
pub mod referral;
pub mod storage;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::LoyaltyLedger;
pub use storage::RocksStore;
pub use store::{AccountStore, CasOutcome, MemoryStore, Version, Versioned};
pub use types::{
    Accrual, CustomerId, CustomerRecord, LoyaltyAccount, ReferralOutcome, Tier, REFERRAL_BONUS,
};
