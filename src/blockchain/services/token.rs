// src/blockchain/services/token.rs

use anyhow::anyhow;
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{Address, Bytes, TransactionRequest, U256};
use ethers_core::utils::keccak256;

use crate::blockchain::{amount::MAX_DECIMALS, chains::ChainConfig, client::BlockchainClient, error::AgentError};

pub(crate) fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

pub(crate) fn encode_call(sig: &str, tokens: Vec<Token>) -> Bytes {
    let mut out = selector(sig).to_vec();
    let mut tail = encode(&tokens);
    out.append(&mut tail);
    Bytes::from(out)
}

pub(crate) fn decode_u256(raw: &[u8]) -> Option<U256> {
    match decode(&[ParamType::Uint(256)], raw).ok()?.first() {
        Some(Token::Uint(n)) => Some(*n),
        _ => None,
    }
}

pub fn balance_of_call(owner: Address) -> Bytes {
    encode_call("balanceOf(address)", vec![Token::Address(owner)])
}

pub fn decimals_call() -> Bytes {
    encode_call("decimals()", vec![])
}

pub fn allowance_call(owner: Address, spender: Address) -> Bytes {
    encode_call(
        "allowance(address,address)",
        vec![Token::Address(owner), Token::Address(spender)],
    )
}

pub fn erc20_transfer_tx(token: Address, to: Address, amount: U256) -> TransactionRequest {
    let data = encode_call("transfer(address,uint256)", vec![Token::Address(to), Token::Uint(amount)]);
    TransactionRequest::new().to(token).data(data)
}

pub fn erc20_approve_tx(token: Address, spender: Address, amount: U256) -> TransactionRequest {
    let data = encode_call("approve(address,uint256)", vec![Token::Address(spender), Token::Uint(amount)]);
    TransactionRequest::new().to(token).data(data)
}

async fn read_u256(
    client: &BlockchainClient,
    chain: &ChainConfig,
    token: Address,
    data: Bytes,
    what: &str,
) -> Result<U256, AgentError> {
    let raw = client.gateway().call(chain, token, data).await?;
    decode_u256(&raw).ok_or_else(|| {
        AgentError::Rpc(anyhow!("{} of {:?} returned undecodable data 0x{}", what, token, hex::encode(&raw)))
    })
}

pub async fn decimals(client: &BlockchainClient, chain: &ChainConfig, token: Address) -> Result<u8, AgentError> {
    let value = read_u256(client, chain, token, decimals_call(), "decimals()").await?;
    if value > U256::from(MAX_DECIMALS) {
        return Err(AgentError::Rpc(anyhow!("decimals() of {:?} out of range: {}", token, value)));
    }
    Ok(value.as_u32() as u8)
}

pub async fn balance_of(
    client: &BlockchainClient,
    chain: &ChainConfig,
    token: Address,
    owner: Address,
) -> Result<U256, AgentError> {
    read_u256(client, chain, token, balance_of_call(owner), "balanceOf()").await
}

pub async fn allowance(
    client: &BlockchainClient,
    chain: &ChainConfig,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256, AgentError> {
    read_u256(client, chain, token, allowance_call(owner, spender), "allowance()").await
}
