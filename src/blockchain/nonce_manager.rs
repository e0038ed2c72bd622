// src/blockchain/nonce_manager.rs

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use tokio::sync::Mutex;

// Hands out sequential nonces per (chain, sender) so concurrent transfers and
// swaps from one account never reuse a nonce.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // Each account gets its own state, protected by a Mutex.
    // The DashMap allows concurrent access to different accounts.
    nonces: Arc<DashMap<(String, Address), Arc<Mutex<NonceState>>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<U256>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, chain_id: &str, address: Address) -> Arc<Mutex<NonceState>> {
        self.nonces
            .entry((chain_id.to_string(), address))
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone()
    }

    /// Gets the next nonce for `address` on `chain_id`.
    /// `fetch` supplies the on-chain transaction count the first time an
    /// account is seen (or after a reset); later calls increment locally.
    pub async fn get_next_nonce<F, Fut>(&self, chain_id: &str, address: Address, fetch: F) -> anyhow::Result<U256>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<U256>>,
    {
        let slot = self.slot(chain_id, address);
        // Lock the mutex specifically for this account.
        let mut state = slot.lock().await;

        let nonce_to_use = match state.next_nonce {
            Some(nonce) => nonce,
            None => fetch().await?,
        };

        // Increment the nonce for the *next* transaction and save it.
        state.next_nonce = Some(nonce_to_use + U256::one());

        Ok(nonce_to_use)
    }

    /// Forgets the cached nonce so the next call re-reads it from the chain.
    /// Used after a broadcast that produced no hash, which would otherwise leave a gap.
    pub async fn reset(&self, chain_id: &str, address: Address) {
        let slot = self.slot(chain_id, address);
        slot.lock().await.next_nonce = None;
    }
}
