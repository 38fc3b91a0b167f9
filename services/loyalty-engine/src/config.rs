use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub data_dir: String,
    pub max_txn_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8084)?
            .set_default("server.workers", 4)?
            .set_default("store.data_dir", "./data/loyalty")?
            .set_default("store.max_txn_attempts", 5)?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("LOYALTY_ENGINE").separator("__"),
        );

        // Special handling for common env vars
        if let Ok(data_dir) = env::var("LOYALTY_DATA_DIR") {
            builder = builder.set_override("store.data_dir", data_dir)?;
        }

        if let Ok(port) = env::var("LOYALTY_ENGINE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.store.data_dir.is_empty() {
            return Err("Store data directory is required".to_string());
        }

        if self.store.max_txn_attempts == 0 {
            return Err("max_txn_attempts must be at least 1".to_string());
        }

        Ok(())
    }

    /// Core ledger configuration derived from service settings
    pub fn ledger_config(&self) -> loyalty_core::Config {
        let mut cfg = loyalty_core::Config::default();
        cfg.data_dir = PathBuf::from(&self.store.data_dir);
        cfg.transaction.max_attempts = self.store.max_txn_attempts;
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::from_env().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.ledger_config().transaction.max_attempts, config.store.max_txn_attempts);
    }
}
