// src/blockchain/services/approval.rs

use ethers_core::types::{Address, H256, U256};
use tracing::{debug, info};

use super::token;
use crate::blockchain::{chains::ChainConfig, client::BlockchainClient, error::AgentError};

/// Makes sure `spender` may move `amount` of `token` from the agent's account.
///
/// Reads the allowance first and only submits `approve(spender, amount)` when it
/// is short, so re-running after a success is a no-op. Waits for the approval
/// receipt before returning its hash.
pub async fn ensure_allowance(
    client: &BlockchainClient,
    chain: &ChainConfig,
    token_address: Address,
    spender: Address,
    amount: U256,
    encrypt: bool,
) -> Result<Option<H256>, AgentError> {
    let owner = client.gateway().account();
    let current = token::allowance(client, chain, token_address, owner, spender).await?;
    if current >= amount {
        debug!("Allowance {} of {:?} already covers {}", current, token_address, amount);
        return Ok(None);
    }

    info!("Approving {:?} to spend {} of {:?} on {}", spender, amount, token_address, chain.name);
    let tx = token::erc20_approve_tx(token_address, spender, amount);
    let tx_hash = client
        .submit(chain, tx, encrypt)
        .await?
        .ok_or(AgentError::TransactionNotSubmitted)?;
    client.wait_for_receipt(chain, tx_hash).await?;

    Ok(Some(tx_hash))
}
