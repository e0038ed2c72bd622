// src/blockchain/resolver.rs

use std::str::FromStr;

use ethers::types::Address;
use serde::Serialize;
use tracing::warn;

use crate::blockchain::{chains::ChainConfig, error::AgentError};

/// A token reference reduced to an on-chain address plus its native classification.
///
/// Native tokens resolve to the wrapped-native contract: routers only speak
/// ERC-20, while the execution path is still chosen by `is_native`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedToken {
    pub address: Address,
    pub is_native: bool,
}

pub const NATIVE_SENTINEL: &str = "native";

/// `0x` followed by 40 characters. Only the shape is checked here.
pub fn looks_like_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x")
}

/// Empty, `null` and `undefined` are what an upstream parser emits for "not given".
pub fn is_blank(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => true,
        Some(v) => v.is_empty() || v.eq_ignore_ascii_case("null") || v.eq_ignore_ascii_case("undefined"),
    }
}

/// Resolves a symbol, the `native` sentinel, or a literal address.
pub fn resolve(token: &str, chain: &ChainConfig) -> Result<ResolvedToken, AgentError> {
    let token = token.trim();

    if looks_like_address(token) {
        let address = Address::from_str(token).map_err(|_| AgentError::InvalidAddress(token.to_string()))?;
        return Ok(ResolvedToken { address, is_native: false });
    }

    if chain.is_native_symbol(token) || token.eq_ignore_ascii_case(NATIVE_SENTINEL) {
        let address = chain.wrapped_native_address().ok_or_else(|| AgentError::UnsupportedToken {
            token: chain.wrapped_native_symbol(),
            chain: chain.name.clone(),
        })?;
        return Ok(ResolvedToken { address, is_native: true });
    }

    chain
        .token_addresses
        .get(token)
        .map(|address| ResolvedToken { address: *address, is_native: false })
        .ok_or_else(|| AgentError::UnsupportedToken {
            token: token.to_string(),
            chain: chain.name.clone(),
        })
}

/// Token reference for transfers and balances: a blank reference means the native token.
pub fn token_or_native<'a>(token: Option<&'a str>, chain: &'a ChainConfig) -> &'a str {
    match token {
        Some(t) if !is_blank(Some(t)) => t.trim(),
        _ => chain.native_token_symbol.as_str(),
    }
}

/// Normalizes a free-form account address, falling back to `own` when the
/// input is blank, is actually a token symbol, or is not `0x` + 40 characters.
/// Any other `0x` string passes through unvalidated to the RPC layer.
pub fn account_or_own(input: Option<&str>, chain: &ChainConfig, own: Address) -> String {
    let own_hex = format!("{:?}", own);
    if is_blank(input) {
        return own_hex;
    }
    let value = input.unwrap_or_default().trim();
    if chain.find_symbol_ci(value).is_some() {
        warn!("Address '{}' is a token symbol on {}, using own wallet", value, chain.name);
        return own_hex;
    }
    if !looks_like_address(value) {
        warn!("Address '{}' is not a 0x address, using own wallet", value);
        return own_hex;
    }
    value.to_string()
}

pub fn parse_account(value: &str) -> Result<Address, AgentError> {
    Address::from_str(value).map_err(|_| AgentError::InvalidAddress(value.to_string()))
}
