// src/blockchain/mod.rs

// Re-export the client module with the service facade
pub mod client;
pub use client::BlockchainClient;

// Re-export other modules
pub mod amount;
pub mod chains;
pub mod encryption;
pub mod error;
pub mod evm_client;
pub mod gateway;
pub mod models;
pub mod nonce_manager;
pub mod resolver;
pub mod services;

pub use chains::{ChainConfig, ChainRegistry};
pub use encryption::EncryptionMode;
pub use error::AgentError;
pub use gateway::ChainGateway;

// Re-export commonly used types
pub use ethers::types::{Address, H256, U256};
