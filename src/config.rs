//! Configuration management
//!
//! Loads configuration from config.toml with support for:
//! - Server binding settings
//! - Ledger owner and re-activation policy
//! - Journal location
//!
//! Environment variables override file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::access::is_valid_principal;
use crate::ledger::LedgerOptions;
use crate::types::Principal;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Initial owner of the ledger
    pub owner: String,
    #[serde(default)]
    pub allow_reactivation: bool,
}

impl LedgerConfig {
    pub fn owner_principal(&self) -> Result<Principal> {
        if !is_valid_principal(&self.owner) {
            bail!("Invalid ledger owner {:?}", self.owner);
        }
        Ok(Principal::new(self.owner.clone()))
    }

    pub fn options(&self) -> LedgerOptions {
        LedgerOptions {
            allow_reactivation: self.allow_reactivation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite journal path; no persistence when unset
    #[serde(default)]
    pub journal_path: Option<String>,
}

impl Config {
    /// Load configuration from default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            toml::from_str(DEFAULT_CONFIG).context("Failed to parse default config")
        }
    }

    /// Override values from `lookup` (the process environment in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("LEDGER_HOST").filter(|v| !v.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("LEDGER_PORT").filter(|v| !v.is_empty()) {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid LEDGER_PORT {:?}", port))?;
        }
        if let Some(owner) = lookup("LEDGER_OWNER").filter(|v| !v.is_empty()) {
            self.ledger.owner = owner;
        }
        if let Some(path) = lookup("LEDGER_JOURNAL").filter(|v| !v.is_empty()) {
            self.storage.journal_path = Some(path);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            ledger: LedgerConfig {
                owner: "owner".to_string(),
                allow_reactivation: false,
            },
            storage: StorageConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_embedded_default_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(!config.ledger.allow_reactivation);
        assert!(config.storage.journal_path.is_none());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Config::load_from("/nonexistent/ledger.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_storage_section_is_optional() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [ledger]
            owner = "0xowner"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.ledger.options(), LedgerOptions::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LEDGER_PORT", "9100"),
            ("LEDGER_OWNER", "0xadmin"),
            ("LEDGER_JOURNAL", "/tmp/journal.db"),
            ("LEDGER_HOST", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.ledger.owner, "0xadmin");
        assert_eq!(
            config.storage.journal_path.as_deref(),
            Some("/tmp/journal.db")
        );
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == "LEDGER_PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_owner_must_be_a_valid_principal() {
        let mut config = Config::default();
        config.ledger.owner = "two words".to_string();
        assert!(config.ledger.owner_principal().is_err());
    }
}
