//! Host-side settings
//!
//! Settings for the process embedding the engine: log level, genesis file
//! and the module accounts. Read from a TOML file, with `.env` / environment
//! overrides for the values operators change most. On-chain parameters are
//! not here; they live in the persisted `EngineConfig`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::arbitrage::EngineAccounts;
use crate::keeper::GenesisState;
use crate::types::AccountId;

/// Top-level TOML structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub general: GeneralSettings,
    pub accounts: AccountSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
    pub genesis_file: String,
}

fn default_log_level() -> String { "info".to_string() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub module: AccountId,
    pub authority: AccountId,
}

impl EngineSettings {
    /// Load from a TOML file, then apply `.env` and environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {}", path.as_ref().display()))?;
        let mut settings = Self::from_toml_str(&content)?;

        dotenv::dotenv().ok();
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML settings")
    }

    /// `ARB_LOG_LEVEL` and `ARB_GENESIS` replace their file values
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ARB_LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(genesis) = lookup("ARB_GENESIS") {
            self.general.genesis_file = genesis;
        }
    }

    pub fn engine_accounts(&self) -> EngineAccounts {
        EngineAccounts {
            module: self.accounts.module.clone(),
            authority: self.accounts.authority.clone(),
        }
    }

    /// Read and validate the genesis document named in `[general]`
    pub fn load_genesis(&self) -> Result<GenesisState> {
        let path = &self.general.genesis_file;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read genesis file: {}", path))?;
        let genesis: GenesisState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse genesis file: {}", path))?;
        genesis
            .validate()
            .with_context(|| format!("Invalid genesis in {}", path))?;
        Ok(genesis)
    }
}
