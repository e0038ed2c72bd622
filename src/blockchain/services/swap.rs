// src/blockchain/services/swap.rs

use chrono::Utc;
use ethers_core::types::{Address, Bytes, TransactionRequest, U256};
use tracing::info;

use super::{approval, quote, router, token};
use crate::blockchain::{
    amount::{format_units, DecimalAmount},
    chains::{ChainConfig, NATIVE_DECIMALS},
    client::BlockchainClient,
    encryption::EncryptionMode,
    error::AgentError,
    models::{QuoteRequest, QuoteResult, SwapRequest, SwapResult, SwapRoute},
    resolver::{is_blank, resolve, ResolvedToken},
};

/// Router calls expire this many seconds after they are built.
pub const DEADLINE_SECS: i64 = 5 * 60;

/// Picks the router entry point from the native flags of the two sides.
pub fn plan_route(input: &ResolvedToken, output: &ResolvedToken) -> Result<SwapRoute, AgentError> {
    match (input.is_native, output.is_native) {
        (true, true) => Err(AgentError::NativeToNativeSwap),
        _ if input.address == output.address => Err(AgentError::SameTokenSwap),
        (true, false) => Ok(SwapRoute::ExactNativeForTokens),
        (false, true) => Ok(SwapRoute::ExactTokensForNative),
        (false, false) => Ok(SwapRoute::ExactTokensForTokens),
    }
}

/// A fully priced router call, ready to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub route: SwapRoute,
    pub router: Address,
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: [Address; 2],
    pub recipient: Address,
    pub deadline: U256,
}

impl SwapPlan {
    pub fn calldata(&self) -> Bytes {
        match self.route {
            SwapRoute::ExactNativeForTokens => router::swap_exact_eth_for_tokens_call(
                self.amount_out_min,
                &self.path,
                self.recipient,
                self.deadline,
            ),
            SwapRoute::ExactTokensForNative => router::swap_exact_tokens_for_eth_call(
                self.amount_in,
                self.amount_out_min,
                &self.path,
                self.recipient,
                self.deadline,
            ),
            SwapRoute::ExactTokensForTokens => router::swap_exact_tokens_for_tokens_call(
                self.amount_in,
                self.amount_out_min,
                &self.path,
                self.recipient,
                self.deadline,
            ),
        }
    }

    pub fn transaction(&self) -> TransactionRequest {
        let tx = TransactionRequest::new().to(self.router).data(self.calldata());
        match self.route {
            SwapRoute::ExactNativeForTokens => tx.value(self.amount_in),
            _ => tx,
        }
    }
}

struct Validated<'a> {
    chain: &'a ChainConfig,
    router: Address,
    input_ref: &'a str,
    output_ref: &'a str,
    amount: DecimalAmount,
    // as the caller wrote it, echoed back in results
    amount_text: &'a str,
    slippage: f64,
}

// Everything here is local: no network call happens before it succeeds.
fn validate<'a>(client: &'a BlockchainClient, request: &'a SwapRequest) -> Result<Validated<'a>, AgentError> {
    let chain = client.chain(&request.chain)?;

    let input_ref = match request.input_token.as_deref() {
        Some(t) if !is_blank(Some(t)) => t.trim(),
        _ => return Err(AgentError::MissingToken("input")),
    };
    let output_ref = match request.output_token.as_deref() {
        Some(t) if !is_blank(Some(t)) => t.trim(),
        _ => return Err(AgentError::MissingToken("output")),
    };
    if input_ref.eq_ignore_ascii_case(output_ref) {
        return Err(AgentError::SameTokenSwap);
    }

    let amount_text = match request.amount.as_deref() {
        Some(a) if !a.trim().is_empty() => a.trim(),
        _ => return Err(AgentError::MissingAmount),
    };
    let amount = DecimalAmount::parse_positive(amount_text)?;
    let slippage = quote::validate_slippage(request.slippage)?;
    let router = chain
        .router_address
        .ok_or_else(|| AgentError::RouterNotConfigured(chain.name.clone()))?;

    Ok(Validated { chain, router, input_ref, output_ref, amount, amount_text, slippage })
}

async fn token_decimals(client: &BlockchainClient, chain: &ChainConfig, token: &ResolvedToken) -> Result<u8, AgentError> {
    if token.is_native {
        Ok(NATIVE_DECIMALS)
    } else {
        token::decimals(client, chain, token.address).await
    }
}

struct Priced<'a> {
    validated: Validated<'a>,
    input: ResolvedToken,
    output: ResolvedToken,
    output_decimals: u8,
    amount_out: U256,
    plan: SwapPlan,
}

async fn price<'a>(client: &'a BlockchainClient, request: &'a SwapRequest) -> Result<Priced<'a>, AgentError> {
    let validated = validate(client, request)?;
    let chain = validated.chain;

    let input = resolve(validated.input_ref, chain)?;
    let output = resolve(validated.output_ref, chain)?;
    let route = plan_route(&input, &output)?;

    let input_decimals = token_decimals(client, chain, &input).await?;
    let amount_in = validated.amount.to_base_units(input_decimals)?;
    let deadline = U256::from((Utc::now().timestamp() + DEADLINE_SECS) as u64);

    let quoted = quote::calculate_amount_out(
        client,
        chain,
        amount_in,
        input.address,
        output.address,
        validated.slippage,
    )
    .await?;
    // Read independently: the two sides may use different precisions.
    let output_decimals = token_decimals(client, chain, &output).await?;

    let plan = SwapPlan {
        route,
        router: validated.router,
        amount_in,
        amount_out_min: quoted.amount_out_min,
        path: [input.address, output.address],
        recipient: client.gateway().account(),
        deadline,
    };

    Ok(Priced {
        validated,
        input,
        output,
        output_decimals,
        amount_out: quoted.amount_out,
        plan,
    })
}

/// Prices a swap exactly as [`swap`] would, without approving or submitting.
/// For token inputs the router's current allowance is read to report whether
/// an approval would be sent first.
pub async fn quote(client: &BlockchainClient, request: &QuoteRequest) -> Result<QuoteResult, AgentError> {
    let priced = price(client, request).await?;
    let chain = priced.validated.chain;
    let plan = &priced.plan;

    let approval_required = if plan.route.requires_approval() {
        let owner = client.gateway().account();
        let current = token::allowance(client, chain, priced.input.address, owner, plan.router).await?;
        current < plan.amount_in
    } else {
        false
    };

    Ok(QuoteResult {
        chain: chain.name.clone(),
        input_token: priced.validated.input_ref.to_string(),
        output_token: priced.validated.output_ref.to_string(),
        input_address: priced.input.address,
        output_address: priced.output.address,
        route: priced.plan.route,
        amount_in: priced.validated.amount_text.to_string(),
        amount_out: format_units(priced.amount_out, priced.output_decimals),
        amount_out_min: format_units(priced.plan.amount_out_min, priced.output_decimals),
        slippage: priced.validated.slippage,
        approval_required,
    })
}

/// Validate, resolve, quote, approve if needed, submit and confirm one swap.
pub async fn swap(client: &BlockchainClient, request: &SwapRequest, mode: EncryptionMode) -> Result<SwapResult, AgentError> {
    let priced = price(client, request).await?;
    let chain = priced.validated.chain;
    let plan = &priced.plan;
    let encrypt = mode.should_encrypt(request.encrypt);

    let approval_tx = if plan.route.requires_approval() {
        approval::ensure_allowance(client, chain, priced.input.address, plan.router, plan.amount_in, encrypt).await?
    } else {
        None
    };

    let tx_hash = client
        .submit(chain, plan.transaction(), encrypt)
        .await?
        .ok_or(AgentError::SwapNotSubmitted)?;
    client.wait_for_receipt(chain, tx_hash).await?;

    let hash = format!("{:?}", tx_hash);
    info!(
        "Swapped {} {} for {} on {} via {:?} ({})",
        priced.validated.amount, priced.validated.input_ref, priced.validated.output_ref, chain.name, plan.route, hash
    );

    Ok(SwapResult {
        chain: chain.name.clone(),
        explorer_url: chain.tx_url(&hash),
        tx_hash: hash,
        approval_tx_hash: approval_tx.map(|h| format!("{:?}", h)),
        input_token: priced.validated.input_ref.to_string(),
        output_token: priced.validated.output_ref.to_string(),
        input_address: priced.input.address,
        output_address: priced.output.address,
        route: plan.route,
        amount_in: priced.validated.amount_text.to_string(),
        amount_out: format_units(priced.amount_out, priced.output_decimals),
        amount_out_min: format_units(plan.amount_out_min, priced.output_decimals),
        encrypted: encrypt,
    })
}
