use tracing::debug;

use crate::blockchain::{
    amount::format_units,
    chains::NATIVE_DECIMALS,
    client::BlockchainClient,
    error::AgentError,
    models::{BalanceRequest, BalanceResult},
    resolver::{account_or_own, parse_account, resolve, token_or_native},
    services::token,
};

pub async fn get_balance(client: &BlockchainClient, request: &BalanceRequest) -> Result<BalanceResult, AgentError> {
    let chain = client.chain(&request.chain)?;
    let own = client.gateway().account();
    let address = account_or_own(request.address.as_deref(), chain, own);
    let token_ref = token_or_native(request.token.as_deref(), chain);
    let resolved = resolve(token_ref, chain)?;
    let account = parse_account(&address)?;

    let amount = if resolved.is_native {
        let raw = client.gateway().native_balance(chain, account).await?;
        format_units(raw, NATIVE_DECIMALS)
    } else {
        let raw = token::balance_of(client, chain, resolved.address, account).await?;
        let decimals = token::decimals(client, chain, resolved.address).await?;
        format_units(raw, decimals)
    };
    debug!("Balance of {} on {}: {} {}", address, chain.name, amount, token_ref);

    Ok(BalanceResult {
        chain: chain.name.clone(),
        address,
        token: token_ref.to_string(),
        amount,
    })
}
