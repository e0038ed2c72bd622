// src/lib.rs

// Re-export commonly used types
pub use ethers::types::{Address, H256, U256};

// Re-export modules
pub mod api;
pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Balance, transfer and swap operations over the configured chains
    pub client: blockchain::BlockchainClient,
}
