//! Process-wide service state
//!
//! The store client is opened lazily on first use and shared by every
//! request. When opening fails (bad data directory, missing volume) each
//! request reports `StoreUnavailable` and the next one retries, instead of
//! the process crashing at boot.

use crate::config::Config;
use loyalty_core::{Error as LedgerError, LoyaltyLedger, RocksStore};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct AppState {
    config: Config,
    ledger: OnceCell<Arc<LoyaltyLedger>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ledger: OnceCell::new(),
        }
    }

    /// Lazily open the backing store and hand out the shared ledger handle
    pub async fn ledger(&self) -> Result<Arc<LoyaltyLedger>, LedgerError> {
        self.ledger
            .get_or_try_init(|| async {
                let core_config = self.config.ledger_config();
                let store = RocksStore::open(&core_config)
                    .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;
                Ok(Arc::new(LoyaltyLedger::new(Arc::new(store), core_config)))
            })
            .await
            .map(Arc::clone)
    }
}
