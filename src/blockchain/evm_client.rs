// src/blockchain/evm_client.rs

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use ethers_signers::{LocalWallet, Signer};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::blockchain::{chains::ChainConfig, gateway::ChainGateway, nonce_manager::NonceManager};

/// How long `wait_for_receipt` polls before giving up.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// [`ChainGateway`] over raw JSON-RPC, signing locally with one wallet.
#[derive(Clone)]
pub struct RpcGateway {
    client: Client,
    wallet: LocalWallet,
    nonce_manager: NonceManager,
    receipts: ReceiptPolicy,
}

fn parse_quantity(v: &Value, what: &str) -> Result<U256> {
    let hex = v.as_str().ok_or_else(|| anyhow!("{} is not a hex string: {}", what, v))?;
    Ok(U256::from_str_radix(hex.trim_start_matches("0x"), 16)?)
}

impl RpcGateway {
    pub fn new(private_key: &str, receipts: ReceiptPolicy) -> Result<Self> {
        let wallet = LocalWallet::from_str(private_key.trim_start_matches("0x"))
            .map_err(|e| anyhow!("Invalid private key: {}", e))?;
        Ok(Self {
            client: Client::new(),
            wallet,
            nonce_manager: NonceManager::new(),
            receipts,
        })
    }

    async fn rpc(&self, rpc_url: &str, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        debug!("RPC {} -> {}", method, rpc_url);
        let resp: Value = self
            .client
            .post(rpc_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{} request failed", method))?
            .json()
            .await
            .with_context(|| format!("{} returned invalid JSON", method))?;
        if let Some(err) = resp.get("error") {
            return Err(anyhow!("RPC Error in {}: {}", method, err));
        }
        Ok(resp.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn fetch_nonce(&self, rpc_url: &str, address: Address) -> Result<U256> {
        let result = self
            .rpc(rpc_url, "eth_getTransactionCount", json!([format!("{:?}", address), "pending"]))
            .await?;
        parse_quantity(&result, "transaction count")
    }

    async fn sign_and_send(&self, chain: &ChainConfig, tx_request: TransactionRequest) -> Result<Option<H256>> {
        let rpc_url = chain.rpc_url.as_str();
        let from_address = self.wallet.address();
        let chain_id: u64 = chain
            .chain_id
            .parse()
            .with_context(|| format!("chain id '{}' is not numeric", chain.chain_id))?;

        let nonce = self
            .nonce_manager
            .get_next_nonce(&chain.chain_id, from_address, || self.fetch_nonce(rpc_url, from_address))
            .await?;

        // Populate the final transaction request
        let mut tx = tx_request.from(from_address).nonce(nonce).chain_id(chain_id);

        // If gas is not provided, estimate it via eth_estimateGas
        if tx.gas.is_none() {
            let call_obj = serde_json::to_value(&tx)?;
            let gas = self.rpc(rpc_url, "eth_estimateGas", json!([call_obj])).await?;
            tx = tx.gas(parse_quantity(&gas, "gas estimate")?);
        }

        // If gas price not provided, fetch eth_gasPrice and use legacy gas_price
        if tx.gas_price.is_none() {
            let gp = self.rpc(rpc_url, "eth_gasPrice", json!([])).await?;
            tx = tx.gas_price(parse_quantity(&gp, "gas price")?);
        }

        // Sign the transaction
        let signature = self.wallet.sign_transaction(&tx.clone().into()).await?;
        let raw_tx = tx.rlp_signed(&signature);

        let result = self
            .rpc(rpc_url, "eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw_tx))]))
            .await?;

        match result.as_str() {
            Some(hash) if !hash.is_empty() => Ok(Some(H256::from_str(hash).context("invalid transaction hash")?)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    fn account(&self) -> Address {
        self.wallet.address()
    }

    async fn native_balance(&self, chain: &ChainConfig, address: Address) -> Result<U256> {
        let result = self
            .rpc(&chain.rpc_url, "eth_getBalance", json!([format!("{:?}", address), "latest"]))
            .await?;
        parse_quantity(&result, "balance")
    }

    async fn call(&self, chain: &ChainConfig, to: Address, data: Bytes) -> Result<Bytes> {
        let result = self
            .rpc(
                &chain.rpc_url,
                "eth_call",
                json!([{"to": format!("{:?}", to), "data": format!("0x{}", hex::encode(&data))}, "latest"]),
            )
            .await?;
        let s = result.as_str().ok_or_else(|| anyhow!("eth_call result not string"))?;
        Ok(Bytes::from(hex::decode(s.trim_start_matches("0x"))?))
    }

    async fn send_transaction(&self, chain: &ChainConfig, tx: TransactionRequest) -> Result<Option<H256>> {
        let sent = self.sign_and_send(chain, tx).await;
        if !matches!(sent, Ok(Some(_))) {
            // no hash means the reserved nonce never reached the chain
            self.nonce_manager.reset(&chain.chain_id, self.wallet.address()).await;
        }
        sent
    }

    async fn wait_for_receipt(&self, chain: &ChainConfig, tx_hash: H256) -> Result<()> {
        let hash = format!("{:?}", tx_hash);
        let started = tokio::time::Instant::now();
        loop {
            let receipt = self
                .rpc(&chain.rpc_url, "eth_getTransactionReceipt", json!([hash]))
                .await?;
            if !receipt.is_null() {
                let status = receipt.get("status").and_then(Value::as_str).unwrap_or("0x1");
                if status == "0x0" {
                    return Err(anyhow!("transaction {} reverted", hash));
                }
                debug!("Receipt for {} after {:?}", hash, started.elapsed());
                return Ok(());
            }
            if started.elapsed() >= self.receipts.timeout {
                warn!("No receipt for {} within {:?}", hash, self.receipts.timeout);
                return Err(anyhow!("timed out waiting for receipt of {}", hash));
            }
            tokio::time::sleep(self.receipts.poll_interval).await;
        }
    }
}
