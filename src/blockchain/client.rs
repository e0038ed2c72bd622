//! Blockchain client module for EVM-compatible networks.
//!
//! `BlockchainClient` is the single entry point the MCP layer talks to. It owns
//! the shared, read-only chain registry and the two external collaborators
//! (the chain gateway and the transaction encryptor), and delegates each
//! operation to the matching service module.

use std::sync::Arc;

use ethers::types::{TransactionRequest, H256};
use tracing::info;

use crate::blockchain::{
    chains::{ChainConfig, ChainRegistry},
    encryption::{EncryptionMode, TransactionEncryptor},
    error::AgentError,
    gateway::ChainGateway,
    models::{
        BalanceRequest, BalanceResult, ChainSummary, QuoteRequest, QuoteResult, SwapRequest,
        SwapResult, TransferRequest, TransferResult,
    },
    services::{balance, swap, transfer},
};

/// Main client for balance, transfer and swap operations.
#[derive(Clone)]
pub struct BlockchainClient {
    registry: Arc<ChainRegistry>,
    gateway: Arc<dyn ChainGateway>,
    encryptor: Arc<dyn TransactionEncryptor>,
}

impl BlockchainClient {
    pub fn new(
        registry: ChainRegistry,
        gateway: Arc<dyn ChainGateway>,
        encryptor: Arc<dyn TransactionEncryptor>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            gateway,
            encryptor,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &dyn ChainGateway {
        self.gateway.as_ref()
    }

    pub fn chain(&self, name: &str) -> Result<&ChainConfig, AgentError> {
        self.registry.get(name)
    }

    /// Get the balance of an account in the requested token
    pub async fn get_balance(&self, request: &BalanceRequest) -> Result<BalanceResult, AgentError> {
        balance::get_balance(self, request).await
    }

    /// Send native value or ERC-20 tokens
    pub async fn transfer(
        &self,
        request: &TransferRequest,
        mode: EncryptionMode,
    ) -> Result<TransferResult, AgentError> {
        transfer::transfer(self, request, mode).await
    }

    /// Quote a swap without submitting anything
    pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResult, AgentError> {
        swap::quote(self, request).await
    }

    /// Execute a routed swap, approving the router first when needed
    pub async fn swap(&self, request: &SwapRequest, mode: EncryptionMode) -> Result<SwapResult, AgentError> {
        swap::swap(self, request, mode).await
    }

    pub fn chains(&self) -> Vec<ChainSummary> {
        self.registry
            .iter()
            .map(|c| ChainSummary {
                name: c.name.clone(),
                chain_id: c.chain_id.clone(),
                native_token_symbol: c.native_token_symbol.clone(),
                explorer_url: c.explorer_url.clone(),
                tokens: c.token_addresses.keys().cloned().collect(),
                has_router: c.router_address.is_some(),
                encryption_default: c.encryption_default,
            })
            .collect()
    }

    /// Encrypts (when asked) and broadcasts. Returns the hash only if it is usable.
    pub(crate) async fn submit(
        &self,
        chain: &ChainConfig,
        tx: TransactionRequest,
        encrypt: bool,
    ) -> Result<Option<H256>, AgentError> {
        let tx = if encrypt {
            self.encryptor
                .encrypt(chain, tx)
                .await
                .map_err(AgentError::EncryptionFailed)?
        } else {
            tx
        };

        let hash = self.gateway.send_transaction(chain, tx).await?;
        match hash {
            Some(h) if !h.is_zero() => {
                info!("Submitted transaction {:?} on {} (encrypted: {})", h, chain.name, encrypt);
                Ok(Some(h))
            }
            _ => Ok(None),
        }
    }

    pub(crate) async fn wait_for_receipt(&self, chain: &ChainConfig, tx_hash: H256) -> Result<(), AgentError> {
        self.gateway.wait_for_receipt(chain, tx_hash).await?;
        Ok(())
    }
}
