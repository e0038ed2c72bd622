// src/blockchain/error.rs

use thiserror::Error;

/// Errors surfaced by the balance, transfer, quote and swap operations.
///
/// Every variant maps to a stable kind string (see [`AgentError::kind`]) so a
/// presentation layer can pick user copy without matching on the message.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Chain {0} is not supported")]
    UnsupportedChain(String),
    #[error("Token {token} is not supported on chain {chain}")]
    UnsupportedToken { token: String, chain: String },
    #[error("Missing {0} token")]
    MissingToken(&'static str),
    #[error("Recipient address is required")]
    MissingRecipient,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Amount is required")]
    MissingAmount,
    #[error("Amount must be greater than zero")]
    ZeroAmount,
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Cannot swap a token for itself")]
    SameTokenSwap,
    #[error("Cannot swap the native token for itself")]
    NativeToNativeSwap,
    #[error("Slippage must be between 0 and 50 percent, got {0}")]
    InvalidSlippage(f64),
    #[error("No swap router is configured for chain {0}")]
    RouterNotConfigured(String),
    #[error("Quote unavailable: {reason}")]
    QuoteUnavailable {
        reason: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Transaction was not submitted")]
    TransactionNotSubmitted,
    #[error("Swap transaction was not submitted")]
    SwapNotSubmitted,
    #[error("Transaction encryption failed")]
    EncryptionFailed(#[source] anyhow::Error),
    #[error("RPC request failed: {0}")]
    Rpc(#[from] anyhow::Error),
}

impl AgentError {
    /// Stable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::UnsupportedChain(_) => "UnsupportedChain",
            AgentError::UnsupportedToken { .. } => "UnsupportedToken",
            AgentError::MissingToken(_) => "MissingToken",
            AgentError::MissingRecipient => "MissingRecipient",
            AgentError::InvalidAddress(_) => "InvalidAddress",
            AgentError::MissingAmount => "MissingAmount",
            AgentError::ZeroAmount => "ZeroAmount",
            AgentError::NegativeAmount => "NegativeAmount",
            AgentError::InvalidAmount(_) => "InvalidAmount",
            AgentError::SameTokenSwap => "SameTokenSwap",
            AgentError::NativeToNativeSwap => "NativeToNativeSwap",
            AgentError::InvalidSlippage(_) => "InvalidSlippage",
            AgentError::RouterNotConfigured(_) => "RouterNotConfigured",
            AgentError::QuoteUnavailable { .. } => "QuoteUnavailable",
            AgentError::TransactionNotSubmitted => "TransactionNotSubmitted",
            AgentError::SwapNotSubmitted => "SwapNotSubmitted",
            AgentError::EncryptionFailed(_) => "EncryptionFailed",
            AgentError::Rpc(_) => "Rpc",
        }
    }

    /// True for request validation failures, which are raised before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AgentError::UnsupportedChain(_)
                | AgentError::UnsupportedToken { .. }
                | AgentError::MissingToken(_)
                | AgentError::MissingRecipient
                | AgentError::InvalidAddress(_)
                | AgentError::MissingAmount
                | AgentError::ZeroAmount
                | AgentError::NegativeAmount
                | AgentError::InvalidAmount(_)
                | AgentError::SameTokenSwap
                | AgentError::NativeToNativeSwap
                | AgentError::InvalidSlippage(_)
                | AgentError::RouterNotConfigured(_)
        )
    }
}
