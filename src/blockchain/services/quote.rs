// src/blockchain/services/quote.rs

use ethers_core::types::{Address, U256};
use tracing::{debug, warn};

use super::router;
use crate::blockchain::{chains::ChainConfig, client::BlockchainClient, error::AgentError};

pub const DEFAULT_SLIPPAGE: f64 = 0.5;
pub const MAX_SLIPPAGE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountOut {
    pub amount_out: U256,
    pub amount_out_min: U256,
}

pub fn validate_slippage(slippage: Option<f64>) -> Result<f64, AgentError> {
    let value = slippage.unwrap_or(DEFAULT_SLIPPAGE);
    if !value.is_finite() || !(0.0..=MAX_SLIPPAGE).contains(&value) {
        return Err(AgentError::InvalidSlippage(value));
    }
    Ok(value)
}

/// `amount_out * floor((100 - slippage) * 100) / 10000`: the multiplier is
/// rounded down to basis points before it is applied (0.5% gives 9950/10000).
pub fn min_output(amount_out: U256, slippage: f64) -> U256 {
    let multiplier_bps = ((100.0 - slippage) * 100.0).floor() as u64;
    amount_out
        .checked_mul(U256::from(multiplier_bps))
        .map(|scaled| scaled / U256::from(10_000u64))
        // overflow only for amounts near U256::MAX; divide first instead
        .unwrap_or_else(|| amount_out / U256::from(10_000u64) * U256::from(multiplier_bps))
}

// Router reverts carry the raw RPC error; callers get a stable domain reason.
fn quote_failure_reason(err: &anyhow::Error) -> &'static str {
    let text = format!("{:#}", err).to_lowercase();
    if text.contains("liquidity") || text.contains("revert") {
        "no liquidity for this token pair"
    } else {
        "router quote request failed"
    }
}

/// Asks the chain's router what `amount_in` of `input` buys of `output`.
pub async fn calculate_amount_out(
    client: &BlockchainClient,
    chain: &ChainConfig,
    amount_in: U256,
    input: Address,
    output: Address,
    slippage: f64,
) -> Result<AmountOut, AgentError> {
    let router_address = chain
        .router_address
        .ok_or_else(|| AgentError::RouterNotConfigured(chain.name.clone()))?;
    let path = [input, output];

    let raw = match client
        .gateway()
        .call(chain, router_address, router::get_amounts_out_call(amount_in, &path))
        .await
    {
        Ok(raw) => raw,
        Err(err) => {
            warn!("getAmountsOut failed on {}: {:#}", chain.name, err);
            return Err(AgentError::QuoteUnavailable {
                reason: quote_failure_reason(&err).to_string(),
                source: err,
            });
        }
    };

    let amount_out = router::decode_amounts_out(&raw)
        .and_then(|amounts| amounts.get(1).copied())
        .ok_or_else(|| AgentError::QuoteUnavailable {
            reason: "router returned an unexpected quote".to_string(),
            source: anyhow::anyhow!("undecodable getAmountsOut result 0x{}", hex::encode(&raw)),
        })?;

    let amount_out_min = min_output(amount_out, slippage);
    debug!(
        "Quote on {}: {} in -> {} out (min {} at {}% slippage)",
        chain.name, amount_in, amount_out, amount_out_min, slippage
    );

    Ok(AmountOut { amount_out, amount_out_min })
}
