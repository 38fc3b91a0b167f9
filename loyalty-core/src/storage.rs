//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `customers` - customer registry documents (key: customer_id)
//! - `accounts` - versioned loyalty accounts (key: customer_id)
//! - `referral_codes` - referral-code index (key: code, value: customer_id)
//!
//! A single write lock serializes mutations, so the conditional write and
//! the blind increment are atomic with respect to each other. Reads go
//! straight to the database.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{AccountStore, CasOutcome, Version, Versioned};
use crate::types::{CustomerId, CustomerRecord, LoyaltyAccount};
use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};

/// Column family names
const CF_CUSTOMERS: &str = "customers";
const CF_ACCOUNTS: &str = "accounts";
const CF_CODES: &str = "referral_codes";

/// RocksDB-backed [`AccountStore`]
pub struct RocksStore {
    db: DB,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create the database under `config.data_dir`
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_CUSTOMERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CODES, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn read_account(&self, customer_id: &CustomerId) -> Result<Option<Versioned<LoyaltyAccount>>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, customer_id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_account(&self, versioned: &Versioned<LoyaltyAccount>) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        self.db.put_cf(
            cf,
            versioned.doc.customer_id.as_str().as_bytes(),
            bincode::serialize(versioned)?,
        )?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for RocksStore {
    async fn create_customer(
        &self,
        customer: &CustomerRecord,
        account: &LoyaltyAccount,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();

        let customers_cf = self.cf_handle(CF_CUSTOMERS)?;
        let accounts_cf = self.cf_handle(CF_ACCOUNTS)?;
        let codes_cf = self.cf_handle(CF_CODES)?;

        let key = customer.customer_id.as_str().as_bytes();
        if self.db.get_cf(customers_cf, key)?.is_some()
            || self.db.get_cf(accounts_cf, key)?.is_some()
        {
            return Err(Error::CustomerExists(customer.customer_id.clone()));
        }
        if self
            .db
            .get_cf(codes_cf, account.referral_code.as_bytes())?
            .is_some()
        {
            return Err(Error::DuplicateReferralCode(account.referral_code.clone()));
        }

        let versioned = Versioned {
            version: 1,
            doc: account.clone(),
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(customers_cf, key, bincode::serialize(customer)?);
        batch.put_cf(accounts_cf, key, bincode::serialize(&versioned)?);
        batch.put_cf(codes_cf, account.referral_code.as_bytes(), key);
        self.db.write(batch)?;

        Ok(())
    }

    async fn get_account(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Versioned<LoyaltyAccount>>> {
        self.read_account(customer_id)
    }

    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<CustomerRecord>> {
        let cf = self.cf_handle(CF_CUSTOMERS)?;
        match self.db.get_cf(cf, customer_id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn compare_and_swap(
        &self,
        expected: Version,
        account: &LoyaltyAccount,
    ) -> Result<CasOutcome> {
        let _guard = self.write_lock.lock();

        let current = self
            .read_account(&account.customer_id)?
            .ok_or_else(|| Error::AccountNotFound(account.customer_id.clone()))?;
        if current.version != expected {
            return Ok(CasOutcome::Conflict);
        }

        let versioned = Versioned {
            version: expected + 1,
            doc: account.clone(),
        };
        self.write_account(&versioned)?;

        Ok(CasOutcome::Committed(versioned.version))
    }

    async fn increment_points(
        &self,
        customer_id: &CustomerId,
        delta: i64,
    ) -> Result<Option<i64>> {
        let _guard = self.write_lock.lock();

        let current = match self.read_account(customer_id)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let mut updated = current.doc;
        updated.points += delta;
        let versioned = Versioned {
            version: current.version + 1,
            doc: updated,
        };
        self.write_account(&versioned)?;

        Ok(Some(versioned.doc.points))
    }

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<LoyaltyAccount>> {
        let codes_cf = self.cf_handle(CF_CODES)?;
        let customer_id = match self.db.get_cf(codes_cf, code.as_bytes())? {
            Some(bytes) => CustomerId::new(String::from_utf8_lossy(&bytes).into_owned()),
            None => return Ok(None),
        };
        Ok(self.read_account(&customer_id)?.map(|v| v.doc))
    }
}
