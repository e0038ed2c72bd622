// src/blockchain/models.rs
use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};

// --- Request Models ---
//
// Tool arguments are deserialized into these once at the edge; the services
// never look at untyped JSON.

/// Defines the structure for a balance query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    #[serde(alias = "chain_id", alias = "network")]
    pub chain: String,
    /// Account to inspect; blank or non-address input means the agent's own wallet.
    #[serde(default, alias = "wallet_address")]
    pub address: Option<String>,
    /// Symbol, `native`, or a token contract address. Blank means the native token.
    #[serde(default, alias = "token_address")]
    pub token: Option<String>,
}

/// Defines the structure for a native or ERC-20 transfer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(alias = "chain_id", alias = "network")]
    pub chain: String,
    #[serde(default, alias = "token_address")]
    pub token: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default, alias = "to", alias = "to_address")]
    pub recipient: Option<String>,
    /// Extra calldata attached to a native value transfer.
    #[serde(default)]
    pub data: Option<Bytes>,
    #[serde(default, alias = "is_bite", alias = "isBite")]
    pub encrypt: bool,
}

/// Defines the structure for a router swap.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    #[serde(alias = "chain_id", alias = "network")]
    pub chain: String,
    #[serde(default, alias = "input_token", alias = "from_token")]
    pub input_token: Option<String>,
    #[serde(default, alias = "output_token", alias = "to_token")]
    pub output_token: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    /// Percent in [0, 50]; 0.5 when absent.
    #[serde(default)]
    pub slippage: Option<f64>,
    #[serde(default, alias = "is_bite", alias = "isBite")]
    pub encrypt: bool,
}

/// A quote is a swap request that is never submitted.
pub type QuoteRequest = SwapRequest;

// --- Result Models ---

/// Defines the structure for a balance response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResult {
    pub chain: String,
    pub address: String,
    pub token: String,
    pub amount: String,
}

/// Defines the structure for a completed transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub chain: String,
    pub tx_hash: String,
    pub token: String,
    pub token_address: Option<Address>,
    pub recipient: String,
    pub amount: String,
    /// Whether the transaction was encrypted before signing.
    #[serde(rename = "isBite")]
    pub encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

/// The three router entry points, chosen from the two `is_native` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapRoute {
    ExactNativeForTokens,
    ExactTokensForNative,
    ExactTokensForTokens,
}

impl SwapRoute {
    /// Token-input routes need the router to hold an allowance first.
    pub fn requires_approval(self) -> bool {
        !matches!(self, SwapRoute::ExactNativeForTokens)
    }
}

/// Defines the structure for a quote without execution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub chain: String,
    pub input_token: String,
    pub output_token: String,
    pub input_address: Address,
    pub output_address: Address,
    pub route: SwapRoute,
    pub amount_in: String,
    pub amount_out: String,
    pub amount_out_min: String,
    pub slippage: f64,
    /// True when executing would first submit an `approve` to the router.
    pub approval_required: bool,
}

/// Defines the structure for a completed swap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResult {
    pub chain: String,
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_tx_hash: Option<String>,
    pub input_token: String,
    pub output_token: String,
    pub input_address: Address,
    pub output_address: Address,
    pub route: SwapRoute,
    pub amount_in: String,
    pub amount_out: String,
    pub amount_out_min: String,
    #[serde(rename = "isBite")]
    pub encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

/// Defines the structure for one entry of the chain listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub name: String,
    pub chain_id: String,
    pub native_token_symbol: String,
    pub explorer_url: String,
    pub tokens: Vec<String>,
    pub has_router: bool,
    /// Informational; see [`ChainConfig::encryption_default`](crate::blockchain::chains::ChainConfig::encryption_default).
    pub encryption_default: bool,
}
