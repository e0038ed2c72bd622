// src/config.rs

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;

use crate::blockchain::{
    chains::{ChainOverride, ChainRegistry},
    encryption::EncryptionMode,
    evm_client::ReceiptPolicy,
};

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    /// Chain used when a tool call names none.
    pub default_chain: String,
    /// Per-chain changes merged over the built-in registry.
    pub chain_overrides: HashMap<String, ChainOverride>,

    // Signing
    pub private_key: Option<SecretString>,

    // Encryption
    pub encryption_mode: EncryptionMode,
    pub encryption_service_url: Option<String>,

    // Receipt waiting
    pub receipt_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            default_chain: "fair-testnet".to_string(),
            chain_overrides: HashMap::new(),
            private_key: None,
            encryption_mode: EncryptionMode::Manual,
            encryption_service_url: None,
            receipt_timeout_secs: 120,
            receipt_poll_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Builds the chain registry from the built-in table plus overrides.
    pub fn chain_registry(&self) -> Result<ChainRegistry> {
        ChainRegistry::new(self.chain_overrides.clone())
    }

    pub fn receipt_policy(&self) -> ReceiptPolicy {
        ReceiptPolicy {
            timeout: Duration::from_secs(self.receipt_timeout_secs),
            poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let mut chain_overrides: HashMap<String, ChainOverride> = match env::var("CHAIN_CONFIGS") {
            Ok(raw) => serde_json::from_str(&raw)
                .context("Invalid CHAIN_CONFIGS JSON format (expected chain name -> chain config)")?,
            Err(_) => HashMap::new(),
        };

        // Shorthand: a plain chain name -> RPC URL map
        if let Ok(raw) = env::var("CHAIN_RPC_URLS") {
            let urls: HashMap<String, String> =
                serde_json::from_str(&raw).context("Invalid CHAIN_RPC_URLS JSON format")?;
            for (chain, url) in urls {
                chain_overrides.entry(chain).or_default().rpc_url = Some(url);
            }
        }

        let encryption_mode = match env::var("ENCRYPTION_MODE") {
            Ok(raw) => raw.parse().context("ENCRYPTION_MODE must be 'manual' or 'automatic'")?,
            Err(_) => defaults.encryption_mode,
        };

        Ok(Config {
            // Server settings
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .context("PORT must be a valid number")?,

            default_chain: env::var("DEFAULT_CHAIN").unwrap_or(defaults.default_chain),
            chain_overrides,

            private_key: env::var("PRIVATE_KEY").ok().map(SecretString::new),

            encryption_mode,
            encryption_service_url: env::var("ENCRYPTION_SERVICE_URL").ok().filter(|s| !s.is_empty()),

            receipt_timeout_secs: env::var("RECEIPT_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.receipt_timeout_secs.to_string())
                .parse()
                .context("RECEIPT_TIMEOUT_SECS must be a valid number")?,
            receipt_poll_interval_ms: env::var("RECEIPT_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| defaults.receipt_poll_interval_ms.to_string())
                .parse()
                .context("RECEIPT_POLL_INTERVAL_MS must be a valid number")?,
        })
    }
}
