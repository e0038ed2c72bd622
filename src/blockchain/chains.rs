// src/blockchain/chains.rs

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::blockchain::error::AgentError;

/// Decimal precision of every chain's native token.
pub const NATIVE_DECIMALS: u8 = 18;

/// Static description of one EVM network the agent can operate on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: String,
    pub native_token_symbol: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub token_addresses: BTreeMap<String, Address>,
    pub router_address: Option<Address>,
    /// Advertised in the chain listing only. Whether a transaction is encrypted
    /// is decided by the server's encryption mode and the request's flag.
    pub encryption_default: bool,
}

impl ChainConfig {
    /// The registry stores the wrapped native token under `"W" + native symbol`.
    pub fn wrapped_native_symbol(&self) -> String {
        format!("W{}", self.native_token_symbol)
    }

    pub fn wrapped_native_address(&self) -> Option<Address> {
        self.token_addresses.get(&self.wrapped_native_symbol()).copied()
    }

    pub fn is_native_symbol(&self, symbol: &str) -> bool {
        symbol.eq_ignore_ascii_case(&self.native_token_symbol)
    }

    /// Case-insensitive probe over the native symbol and the token table.
    pub fn find_symbol_ci(&self, symbol: &str) -> Option<&str> {
        if self.is_native_symbol(symbol) {
            return Some(self.native_token_symbol.as_str());
        }
        self.token_addresses
            .keys()
            .find(|known| known.eq_ignore_ascii_case(symbol))
            .map(String::as_str)
    }

    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        if self.explorer_url.is_empty() {
            return None;
        }
        Some(format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash))
    }

    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chain_id: String::new(),
            native_token_symbol: String::new(),
            rpc_url: String::new(),
            explorer_url: String::new(),
            token_addresses: BTreeMap::new(),
            router_address: None,
            encryption_default: false,
        }
    }

    fn apply(&mut self, patch: ChainOverride) {
        if let Some(v) = patch.chain_id {
            self.chain_id = v;
        }
        if let Some(v) = patch.native_token_symbol {
            self.native_token_symbol = v;
        }
        if let Some(v) = patch.rpc_url {
            self.rpc_url = v;
        }
        if let Some(v) = patch.explorer_url {
            self.explorer_url = v;
        }
        if let Some(tokens) = patch.token_addresses {
            self.token_addresses.extend(tokens);
        }
        if patch.router_address.is_some() {
            self.router_address = patch.router_address;
        }
        if let Some(v) = patch.encryption_default {
            self.encryption_default = v;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.chain_id.trim().is_empty() {
            return Err(anyhow!("chain '{}' has an empty chainId", self.name));
        }
        if self.rpc_url.trim().is_empty() {
            return Err(anyhow!("chain '{}' has an empty rpcUrl", self.name));
        }
        url::Url::parse(&self.rpc_url)
            .with_context(|| format!("chain '{}' has an invalid rpcUrl", self.name))?;
        if self.native_token_symbol.is_empty() {
            return Err(anyhow!("chain '{}' has no native token symbol", self.name));
        }
        Ok(())
    }
}

/// Caller-supplied changes layered over the built-in chain table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainOverride {
    pub chain_id: Option<String>,
    pub native_token_symbol: Option<String>,
    pub rpc_url: Option<String>,
    pub explorer_url: Option<String>,
    pub token_addresses: Option<BTreeMap<String, Address>>,
    pub router_address: Option<Address>,
    pub encryption_default: Option<bool>,
}

struct BuiltinChain {
    name: &'static str,
    chain_id: &'static str,
    native: &'static str,
    rpc_url: &'static str,
    explorer_url: &'static str,
    router: &'static str,
    encryption_default: bool,
    tokens: &'static [(&'static str, &'static str)],
}

const BUILTIN_CHAINS: &[BuiltinChain] = &[
    BuiltinChain {
        name: "fair-testnet",
        chain_id: "935",
        native: "FAIR",
        rpc_url: "https://testnet-v1.skalenodes.com/v1/fair-testnet",
        explorer_url: "https://fair-testnet.explorer.skalenodes.com",
        router: "0x4A0A8e2f2BE3c8bB1ee5AEa6e5EEeBa1c7c1D9B5",
        encryption_default: true,
        tokens: &[
            ("WFAIR", "0xC0FfEe4b2a1e3b8D5b3e4A5f6d7c8B9a0E1f2D3c"),
            ("USDC", "0x5F7a4c7D8E9b0A1c2D3e4F5a6B7c8D9e0F1a2B3C"),
            ("USDT", "0x3bD6e5F4a3B2c1D0e9F8a7B6c5D4e3F2a1B0c9D8"),
            ("SKL", "0x6c71319b1F910Cd6B31aF5F8FB6fF8d9bE2D0F4e"),
        ],
    },
    BuiltinChain {
        name: "sepolia",
        chain_id: "11155111",
        native: "ETH",
        rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
        explorer_url: "https://sepolia.etherscan.io",
        router: "0xeE567Fe1712Faf6149d80dA1E6934E354124CfE3",
        encryption_default: false,
        tokens: &[
            ("WETH", "0xfFf9976782d46CC05630D1f6eBAb18b2324d6B14"),
            ("USDC", "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
            ("LINK", "0x779877A7B0D9E8603169DdbD7836e478b4624789"),
        ],
    },
];

fn parse_address(chain: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw).with_context(|| format!("invalid built-in address {} on {}", raw, chain))
}

fn builtin_chains() -> Result<Vec<ChainConfig>> {
    BUILTIN_CHAINS
        .iter()
        .map(|c| {
            let mut token_addresses = BTreeMap::new();
            for (symbol, raw) in c.tokens {
                token_addresses.insert(symbol.to_string(), parse_address(c.name, raw)?);
            }
            Ok(ChainConfig {
                name: c.name.to_string(),
                chain_id: c.chain_id.to_string(),
                native_token_symbol: c.native.to_string(),
                rpc_url: c.rpc_url.to_string(),
                explorer_url: c.explorer_url.to_string(),
                token_addresses,
                router_address: Some(parse_address(c.name, c.router)?),
                encryption_default: c.encryption_default,
            })
        })
        .collect()
}

/// Immutable chain table shared by every request.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: BTreeMap<String, ChainConfig>,
}

impl ChainRegistry {
    /// Built-in chains merged with `overrides`. Unknown names in `overrides` declare new chains.
    pub fn new(overrides: HashMap<String, ChainOverride>) -> Result<Self> {
        let mut chains: BTreeMap<String, ChainConfig> = builtin_chains()?
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        for (name, patch) in overrides {
            let key = normalize_chain_name(&name);
            chains
                .entry(key.clone())
                .or_insert_with(|| ChainConfig::empty(&key))
                .apply(patch);
        }

        for chain in chains.values() {
            chain.validate()?;
        }

        Ok(Self { chains })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(HashMap::new())
    }

    /// Looks a chain up by name, or by its numeric chain id.
    pub fn get(&self, name: &str) -> Result<&ChainConfig, AgentError> {
        let key = normalize_chain_name(name);
        if let Some(chain) = self.chains.get(&key) {
            return Ok(chain);
        }
        self.chains
            .values()
            .find(|c| c.chain_id == key)
            .ok_or_else(|| AgentError::UnsupportedChain(name.trim().to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.chains.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.values()
    }
}

// Chain names are matched trimmed and lower-cased, with '_' and ' ' read as '-'.
pub fn normalize_chain_name(input: &str) -> String {
    input.trim().to_lowercase().replace([' ', '_'], "-")
}
