//! Shared fakes for the integration tests: an in-memory chain gateway that
//! answers ERC-20 and router reads, and a recording encryptor.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, NameOrAddress, TransactionRequest, H256, U256};
use ethers::utils::keccak256;

use fair_agent_mcp::blockchain::{
    chains::{ChainConfig, ChainRegistry},
    encryption::{EncryptionMode, TransactionEncryptor},
    gateway::ChainGateway,
    BlockchainClient,
};
use fair_agent_mcp::{config::Config, AppState};

pub const CHAIN: &str = "fair-testnet";

pub fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

pub fn own_account() -> Address {
    Address::repeat_byte(0x11)
}

pub fn recipient() -> Address {
    Address::repeat_byte(0x22)
}

/// Where the fake encryptor redirects every transaction.
pub fn encrypted_destination() -> Address {
    Address::repeat_byte(0xee)
}

pub fn registry() -> ChainRegistry {
    ChainRegistry::builtin().unwrap()
}

pub fn token(symbol: &str) -> Address {
    registry().get(CHAIN).unwrap().token_addresses[symbol]
}

pub fn router() -> Address {
    registry().get(CHAIN).unwrap().router_address.unwrap()
}

/// How `send_transaction` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendReply {
    Hash,
    NoHash,
    ZeroHash,
    Fail,
}

pub struct MockGateway {
    native_balance: Mutex<U256>,
    decimals: Mutex<HashMap<Address, u8>>,
    balances: Mutex<HashMap<Address, U256>>,
    allowances: Mutex<HashMap<Address, U256>>,
    amount_out: Mutex<Option<U256>>,
    reply: Mutex<SendReply>,
    sent: Mutex<Vec<TransactionRequest>>,
    receipts: Mutex<Vec<H256>>,
    calls: Mutex<Vec<(Address, [u8; 4])>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            native_balance: Mutex::new(U256::zero()),
            decimals: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            amount_out: Mutex::new(Some(U256::from(1_000_000u64))),
            reply: Mutex::new(SendReply::Hash),
            sent: Mutex::new(Vec::new()),
            receipts: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_native_balance(self, raw: U256) -> Self {
        *self.native_balance.lock().unwrap() = raw;
        self
    }

    pub fn with_decimals(self, token: Address, decimals: u8) -> Self {
        self.decimals.lock().unwrap().insert(token, decimals);
        self
    }

    pub fn with_token_balance(self, token: Address, raw: U256) -> Self {
        self.balances.lock().unwrap().insert(token, raw);
        self
    }

    pub fn with_allowance(self, token: Address, raw: U256) -> Self {
        self.allowances.lock().unwrap().insert(token, raw);
        self
    }

    /// `None` makes `getAmountsOut` revert.
    pub fn with_amount_out(self, raw: Option<U256>) -> Self {
        *self.amount_out.lock().unwrap() = raw;
        self
    }

    pub fn with_reply(self, reply: SendReply) -> Self {
        *self.reply.lock().unwrap() = reply;
        self
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn receipts(&self) -> Vec<H256> {
        self.receipts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_with(&self, sig: &str) -> usize {
        let sel = selector(sig);
        self.calls.lock().unwrap().iter().filter(|(_, s)| *s == sel).count()
    }

    fn word(value: U256) -> Bytes {
        Bytes::from(encode(&[Token::Uint(value)]))
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    fn account(&self) -> Address {
        own_account()
    }

    async fn native_balance(&self, _chain: &ChainConfig, _address: Address) -> Result<U256> {
        Ok(*self.native_balance.lock().unwrap())
    }

    async fn call(&self, _chain: &ChainConfig, to: Address, data: Bytes) -> Result<Bytes> {
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&data[..4]);
        self.calls.lock().unwrap().push((to, sel));

        if sel == selector("decimals()") {
            let decimals = self.decimals.lock().unwrap().get(&to).copied().unwrap_or(18);
            Ok(Self::word(U256::from(decimals)))
        } else if sel == selector("balanceOf(address)") {
            let raw = self.balances.lock().unwrap().get(&to).copied().unwrap_or_default();
            Ok(Self::word(raw))
        } else if sel == selector("allowance(address,address)") {
            let raw = self.allowances.lock().unwrap().get(&to).copied().unwrap_or_default();
            Ok(Self::word(raw))
        } else if sel == selector("getAmountsOut(uint256,address[])") {
            let amount_in = U256::from_big_endian(&data[4..36]);
            match *self.amount_out.lock().unwrap() {
                Some(out) => Ok(Bytes::from(encode(&[Token::Array(vec![
                    Token::Uint(amount_in),
                    Token::Uint(out),
                ])]))),
                None => Err(anyhow!("execution reverted: UniswapV2Library: INSUFFICIENT_LIQUIDITY")),
            }
        } else {
            Err(anyhow!("unexpected eth_call 0x{}", hex::encode(sel)))
        }
    }

    async fn send_transaction(&self, _chain: &ChainConfig, tx: TransactionRequest) -> Result<Option<H256>> {
        let reply = *self.reply.lock().unwrap();
        if reply == SendReply::Fail {
            return Err(anyhow!("insufficient funds for gas"));
        }

        // a confirmed approve raises the allowance, like the token would
        if let (Some(NameOrAddress::Address(token)), Some(data)) = (&tx.to, &tx.data) {
            if data.len() >= 68 && data[..4] == selector("approve(address,uint256)") {
                let amount = U256::from_big_endian(&data[36..68]);
                self.allowances.lock().unwrap().insert(*token, amount);
            }
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        match reply {
            SendReply::Hash => Ok(Some(H256::from_low_u64_be(sent.len() as u64))),
            SendReply::NoHash => Ok(None),
            _ => Ok(Some(H256::zero())),
        }
    }

    async fn wait_for_receipt(&self, _chain: &ChainConfig, tx_hash: H256) -> Result<()> {
        self.receipts.lock().unwrap().push(tx_hash);
        Ok(())
    }
}

/// Redirects the transaction to [`encrypted_destination`] and prefixes the calldata.
pub struct MockEncryptor {
    fail: bool,
    calls: AtomicUsize,
}

impl MockEncryptor {
    pub fn new() -> Self {
        Self { fail: false, calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { fail: true, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionEncryptor for MockEncryptor {
    async fn encrypt(&self, _chain: &ChainConfig, tx: TransactionRequest) -> Result<TransactionRequest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("encryption service returned 503"));
        }
        let mut data = vec![0xbe, 0x17];
        if let Some(original) = &tx.data {
            data.extend_from_slice(original);
        }
        Ok(tx.to(encrypted_destination()).data(Bytes::from(data)))
    }
}

pub fn client(gateway: &Arc<MockGateway>, encryptor: &Arc<MockEncryptor>) -> BlockchainClient {
    BlockchainClient::new(registry(), gateway.clone(), encryptor.clone())
}

pub fn app_state(gateway: &Arc<MockGateway>, encryptor: &Arc<MockEncryptor>, mode: EncryptionMode) -> AppState {
    let config = Config {
        encryption_mode: mode,
        ..Config::default()
    };
    AppState {
        config,
        client: client(gateway, encryptor),
    }
}

pub fn to_address(tx: &TransactionRequest) -> Option<Address> {
    match &tx.to {
        Some(NameOrAddress::Address(a)) => Some(*a),
        _ => None,
    }
}

pub fn tx_selector(tx: &TransactionRequest) -> Option<[u8; 4]> {
    let data = tx.data.as_ref()?;
    let mut sel = [0u8; 4];
    sel.copy_from_slice(data.get(..4)?);
    Some(sel)
}
