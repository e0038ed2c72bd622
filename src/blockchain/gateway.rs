// src/blockchain/gateway.rs

use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};

use crate::blockchain::chains::ChainConfig;

/// The chain capabilities the agent consumes: reads, signed broadcast and receipts.
///
/// Every call is scoped to one chain from the registry; implementations pick the
/// RPC endpoint from `chain.rpc_url`.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Address of the signing account.
    fn account(&self) -> Address;

    async fn native_balance(&self, chain: &ChainConfig, address: Address) -> Result<U256>;

    /// `eth_call` against `to`, returning the raw return data.
    async fn call(&self, chain: &ChainConfig, to: Address, data: Bytes) -> Result<Bytes>;

    /// Signs and broadcasts `tx`. `None` means the node accepted the request
    /// but returned no transaction hash.
    async fn send_transaction(&self, chain: &ChainConfig, tx: TransactionRequest) -> Result<Option<H256>>;

    /// Blocks until the transaction is mined; a reverted receipt is an error.
    async fn wait_for_receipt(&self, chain: &ChainConfig, tx_hash: H256) -> Result<()>;
}
