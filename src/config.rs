use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_file: String,
    pub bind_addr: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: "data/portfolio_data.json".to_string(),
            bind_addr: "127.0.0.1:8000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> LedgerResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = env::var("PORTFOLIO_DATA_FILE") {
            config.data_file = path;
        }

        if let Ok(addr) = env::var("PORTFOLIO_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> LedgerResult<()> {
        if self.data_file.is_empty() {
            return Err(LedgerError::Configuration(
                "Data file path cannot be empty".to_string(),
            ));
        }

        if self.bind_addr.is_empty() {
            return Err(LedgerError::Configuration(
                "Bind address cannot be empty".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(LedgerError::Configuration(format!(
                "Invalid log level: {}",
                self.log_level
            )));
        }

        Ok(())
    }
}
