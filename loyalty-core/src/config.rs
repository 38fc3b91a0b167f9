//! Configuration for the loyalty ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Optimistic transaction settings
    pub transaction: TransactionConfig,

    /// Referral-code generation settings
    pub referral: ReferralConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/loyalty"),
            service_name: "loyalty-core".to_string(),
            transaction: TransactionConfig::default(),
            referral: ReferralConfig::default(),
        }
    }
}

/// Optimistic transaction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Maximum compare-and-swap attempts before surfacing a conflict
    pub max_attempts: u32,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

/// Referral-code generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralConfig {
    /// Maximum regeneration attempts when a fresh code collides
    pub max_code_attempts: u32,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: 4,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("LOYALTY_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(attempts) = std::env::var("LOYALTY_TXN_MAX_ATTEMPTS") {
            config.transaction.max_attempts = attempts
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad LOYALTY_TXN_MAX_ATTEMPTS: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "loyalty-core");
        assert_eq!(config.transaction.max_attempts, 5);
        assert_eq!(config.referral.max_code_attempts, 4);
    }
}
