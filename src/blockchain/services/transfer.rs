// src/blockchain/services/transfer.rs

use ethers_core::types::TransactionRequest;
use tracing::info;

use super::token;
use crate::blockchain::{
    amount::DecimalAmount,
    chains::NATIVE_DECIMALS,
    client::BlockchainClient,
    encryption::EncryptionMode,
    error::AgentError,
    models::{TransferRequest, TransferResult},
    resolver::{account_or_own, is_blank, parse_account, resolve, token_or_native},
};

/// Sends native value or an ERC-20 `transfer`. Validation runs before any network call.
pub async fn transfer(
    client: &BlockchainClient,
    request: &TransferRequest,
    mode: EncryptionMode,
) -> Result<TransferResult, AgentError> {
    let chain = client.chain(&request.chain)?;

    if is_blank(request.recipient.as_deref()) {
        return Err(AgentError::MissingRecipient);
    }
    let recipient = account_or_own(request.recipient.as_deref(), chain, client.gateway().account());

    // An absent amount passes validation and fails when scaled below.
    let amount = match request.amount.as_deref() {
        Some(a) if !a.trim().is_empty() => Some(DecimalAmount::parse_positive(a)?),
        _ => None,
    };

    let token_ref = token_or_native(request.token.as_deref(), chain);
    let resolved = resolve(token_ref, chain)?;
    let to = parse_account(&recipient)?;
    let amount = amount.ok_or(AgentError::MissingAmount)?;
    let encrypt = mode.should_encrypt(request.encrypt);

    let (tx, token_address) = if resolved.is_native {
        let mut tx = TransactionRequest::new().to(to).value(amount.to_base_units(NATIVE_DECIMALS)?);
        if let Some(data) = request.data.clone().filter(|d| !d.is_empty()) {
            tx = tx.data(data);
        }
        (tx, None)
    } else {
        let decimals = token::decimals(client, chain, resolved.address).await?;
        let raw = amount.to_base_units(decimals)?;
        (token::erc20_transfer_tx(resolved.address, to, raw), Some(resolved.address))
    };

    let tx_hash = client
        .submit(chain, tx, encrypt)
        .await?
        .ok_or(AgentError::TransactionNotSubmitted)?;

    // Native and ERC-20 transfers both wait for confirmation.
    client.wait_for_receipt(chain, tx_hash).await?;

    let hash = format!("{:?}", tx_hash);
    info!("Transferred {} {} to {} on {} ({})", amount, token_ref, recipient, chain.name, hash);

    Ok(TransferResult {
        chain: chain.name.clone(),
        explorer_url: chain.tx_url(&hash),
        tx_hash: hash,
        token: token_ref.to_string(),
        token_address,
        recipient,
        amount: request.amount.clone().unwrap_or_default().trim().to_string(),
        encrypted: encrypt,
    })
}
