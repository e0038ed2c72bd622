// src/blockchain/encryption.rs

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::types::{Address, Bytes, NameOrAddress, TransactionRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::blockchain::chains::ChainConfig;

/// Whether transactions are encrypted before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionMode {
    /// Encrypt only when the request asks for it.
    #[default]
    Manual,
    /// Encrypt every transaction; the request flag is only echoed.
    Automatic,
}

impl EncryptionMode {
    pub fn should_encrypt(self, requested: bool) -> bool {
        match self {
            EncryptionMode::Automatic => true,
            EncryptionMode::Manual => requested,
        }
    }
}

impl FromStr for EncryptionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(EncryptionMode::Manual),
            "automatic" | "auto" => Ok(EncryptionMode::Automatic),
            other => Err(anyhow!("unknown encryption mode '{}', expected 'manual' or 'automatic'", other)),
        }
    }
}

/// Rewrites a transaction so its destination and calldata are hidden until
/// the block is finalized.
#[async_trait]
pub trait TransactionEncryptor: Send + Sync {
    async fn encrypt(&self, chain: &ChainConfig, tx: TransactionRequest) -> Result<TransactionRequest>;
}

/// Used when no encryption service is configured.
pub struct UnconfiguredEncryptor;

#[async_trait]
impl TransactionEncryptor for UnconfiguredEncryptor {
    async fn encrypt(&self, chain: &ChainConfig, _tx: TransactionRequest) -> Result<TransactionRequest> {
        Err(anyhow!(
            "no encryption service configured (set ENCRYPTION_SERVICE_URL) for chain {}",
            chain.name
        ))
    }
}

/// Delegates encryption to an HTTP sidecar running the chain's encryption SDK.
///
/// Request: `{"chainId", "rpcUrl", "to", "data"}`. Response: `{"to", "data"}`,
/// which replace the transaction's destination and calldata.
pub struct RemoteEncryptor {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct EncryptedPayload {
    to: String,
    data: String,
}

impl RemoteEncryptor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TransactionEncryptor for RemoteEncryptor {
    async fn encrypt(&self, chain: &ChainConfig, tx: TransactionRequest) -> Result<TransactionRequest> {
        let to = match &tx.to {
            Some(NameOrAddress::Address(a)) => format!("{:?}", a),
            Some(NameOrAddress::Name(n)) => return Err(anyhow!("cannot encrypt ENS destination {}", n)),
            None => return Err(anyhow!("cannot encrypt a contract deployment")),
        };
        let data = tx
            .data
            .as_ref()
            .map(|d| format!("0x{}", hex::encode(d)))
            .unwrap_or_else(|| "0x".to_string());

        let payload = json!({
            "chainId": chain.chain_id,
            "rpcUrl": chain.rpc_url,
            "to": to,
            "data": data,
        });
        debug!("Encrypting transaction to {} on {}", to, chain.name);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .context("encryption service unreachable")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("encryption service returned {}: {}", status, body));
        }
        let encrypted: EncryptedPayload = resp
            .json()
            .await
            .context("invalid encryption service response")?;

        let new_to = Address::from_str(&encrypted.to).context("encryption service returned invalid 'to'")?;
        let raw = encrypted.data.strip_prefix("0x").unwrap_or(&encrypted.data);
        let new_data = Bytes::from(hex::decode(raw).context("encryption service returned invalid 'data'")?);

        Ok(tx.to(new_to).data(new_data))
    }
}
