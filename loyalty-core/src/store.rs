//! Document-store seam for the loyalty ledger
//!
//! Models the primitives the ledger needs from its backing store: versioned
//! reads, conditional writes, blind atomic increments, an indexed
//! referral-code lookup, and a multi-document create batch. [`MemoryStore`]
//! implements the contract in memory and backs the unit and property tests;
//! [`crate::storage::RocksStore`] is the durable implementation.

use crate::error::{Error, Result};
use crate::types::{CustomerId, CustomerRecord, LoyaltyAccount};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Document version for optimistic concurrency
pub type Version = u64;

/// A document paired with its commit version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Commit version, incremented on every write
    pub version: Version,

    /// The document itself
    pub doc: T,
}

/// Outcome of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write committed at the returned version
    Committed(Version),

    /// Another writer committed first; re-read and retry
    Conflict,
}

/// Storage contract for loyalty accounts and their owning customers
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Commit a customer record and its loyalty account as one batch.
    ///
    /// Either both documents (and the referral-code index entry) become
    /// visible, or neither does.
    async fn create_customer(
        &self,
        customer: &CustomerRecord,
        account: &LoyaltyAccount,
    ) -> Result<()>;

    /// Read an account together with its version
    async fn get_account(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Versioned<LoyaltyAccount>>>;

    /// Read a customer record
    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<CustomerRecord>>;

    /// Conditionally replace an account. Commits only if the stored version
    /// still equals `expected`.
    async fn compare_and_swap(
        &self,
        expected: Version,
        account: &LoyaltyAccount,
    ) -> Result<CasOutcome>;

    /// Atomically add `delta` to an account's points. Returns the new
    /// balance, or `None` when the account does not exist.
    async fn increment_points(
        &self,
        customer_id: &CustomerId,
        delta: i64,
    ) -> Result<Option<i64>>;

    /// Look up the account holding a referral code
    async fn find_by_referral_code(&self, code: &str) -> Result<Option<LoyaltyAccount>>;
}

/// In-memory store.
///
/// All collections sit behind one lock so the create batch and conditional
/// writes stay atomic across the account map and the referral-code index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    customers: HashMap<String, CustomerRecord>,
    accounts: HashMap<String, Versioned<LoyaltyAccount>>,
    // referral_code -> customer_id
    codes: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_customer(
        &self,
        customer: &CustomerRecord,
        account: &LoyaltyAccount,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let id = customer.customer_id.as_str();
        if inner.customers.contains_key(id) || inner.accounts.contains_key(id) {
            return Err(Error::CustomerExists(customer.customer_id.clone()));
        }
        if inner.codes.contains_key(&account.referral_code) {
            return Err(Error::DuplicateReferralCode(account.referral_code.clone()));
        }
        inner.customers.insert(id.to_string(), customer.clone());
        inner.accounts.insert(
            id.to_string(),
            Versioned {
                version: 1,
                doc: account.clone(),
            },
        );
        inner
            .codes
            .insert(account.referral_code.clone(), id.to_string());
        Ok(())
    }

    async fn get_account(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Versioned<LoyaltyAccount>>> {
        Ok(self.inner.read().accounts.get(customer_id.as_str()).cloned())
    }

    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<CustomerRecord>> {
        Ok(self
            .inner
            .read()
            .customers
            .get(customer_id.as_str())
            .cloned())
    }

    async fn compare_and_swap(
        &self,
        expected: Version,
        account: &LoyaltyAccount,
    ) -> Result<CasOutcome> {
        let mut inner = self.inner.write();
        let entry = inner
            .accounts
            .get_mut(account.customer_id.as_str())
            .ok_or_else(|| Error::AccountNotFound(account.customer_id.clone()))?;
        if entry.version != expected {
            return Ok(CasOutcome::Conflict);
        }
        entry.version += 1;
        entry.doc = account.clone();
        Ok(CasOutcome::Committed(entry.version))
    }

    async fn increment_points(
        &self,
        customer_id: &CustomerId,
        delta: i64,
    ) -> Result<Option<i64>> {
        let mut inner = self.inner.write();
        match inner.accounts.get_mut(customer_id.as_str()) {
            Some(entry) => {
                entry.version += 1;
                entry.doc.points += delta;
                Ok(Some(entry.doc.points))
            }
            None => Ok(None),
        }
    }

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<LoyaltyAccount>> {
        let inner = self.inner.read();
        Ok(inner
            .codes
            .get(code)
            .and_then(|id| inner.accounts.get(id))
            .map(|v| v.doc.clone()))
    }
}
