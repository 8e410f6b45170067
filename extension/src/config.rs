use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::services::storage::{CallingConvention, StorageTier};

const EMBEDDED_CONFIG: &str = include_str!("../popup.toml");

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub log_level: Option<String>,
    pub storage: StorageSection,
    pub credential: CredentialSection,
    pub timing: TimingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub key: Option<String>,
    pub tiers: Option<Vec<String>>,
    pub convention: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialSection {
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    pub save_confirmation_ms: Option<u64>,
    pub copy_feedback_ms: Option<u64>,
}

/// Validated popup settings
#[derive(Debug, Clone, PartialEq)]
pub struct PopupConfig {
    pub log_level: log::Level,
    /// Storage key of the credential record
    pub storage_key: String,
    /// Storage tiers in fallback order
    pub tiers: Vec<StorageTier>,
    pub convention: CallingConvention,
    /// Literal tag every saved credential must start with
    pub credential_prefix: String,
    /// How long "saved" stays on screen before switching panels
    pub save_confirmation: Duration,
    /// How long the copy button shows "Copied!"
    pub copy_feedback: Duration,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            log_level: log::Level::Info,
            storage_key: "openaiApiKey".to_string(),
            tiers: vec![StorageTier::Sync, StorageTier::Local],
            convention: CallingConvention::Promise,
            credential_prefix: "sk-".to_string(),
            save_confirmation: Duration::from_millis(1000),
            copy_feedback: Duration::from_millis(2000),
        }
    }
}

impl PopupConfig {
    /// Parse a TOML document; absent fields keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("Failed to parse popup config")?;
        let mut config = Self::default();

        if let Some(level) = file.log_level {
            config.log_level = level
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid log level: {}", level))?;
        }

        if let Some(key) = file.storage.key {
            if key.trim().is_empty() {
                anyhow::bail!("storage.key must not be empty");
            }
            config.storage_key = key;
        }

        if let Some(tiers) = file.storage.tiers {
            config.tiers = tiers
                .iter()
                .map(|name| -> Result<StorageTier> {
                    match name.as_str() {
                        "sync" => Ok(StorageTier::Sync),
                        "local" => Ok(StorageTier::Local),
                        "memory" => Ok(StorageTier::Memory),
                        _ => anyhow::bail!("Invalid storage tier: {}", name),
                    }
                })
                .collect::<Result<_>>()?;
        }

        if let Some(convention) = file.storage.convention {
            config.convention = match convention.as_str() {
                "promise" => CallingConvention::Promise,
                "callback" => CallingConvention::Callback,
                _ => anyhow::bail!("Invalid storage convention: {}", convention),
            };
        }

        if let Some(prefix) = file.credential.prefix {
            config.credential_prefix = prefix;
        }

        if let Some(ms) = file.timing.save_confirmation_ms {
            config.save_confirmation = Duration::from_millis(ms);
        }
        if let Some(ms) = file.timing.copy_feedback_ms {
            config.copy_feedback = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Configuration bundled with the extension
    pub fn embedded() -> Self {
        match Self::from_toml(EMBEDDED_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Embedded popup config is invalid, using defaults: {:#}", e);
                Self::default()
            }
        }
    }
}
