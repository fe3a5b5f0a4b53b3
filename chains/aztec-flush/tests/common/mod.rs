#![allow(dead_code)]

use async_trait::async_trait;
use aztec_flush::chain::{ChainClient, Eip1559Fees, FeeQuote, TxParams, TxReceipt};
use aztec_flush::{ChainError, FlushConfig, WalletPool};
use core_logic::WalletManager;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Anvil's default development keys.
pub const KEYS: [&str; 3] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

pub const EPOCH: u64 = 2304;

/// Unix time of an exact epoch boundary.
pub const BOUNDARY: u64 = EPOCH * 737_000;

pub fn gwei(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(9)
}

pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

pub fn key_list(n: usize) -> String {
    KEYS[..n].join(",")
}

pub fn pool(n: usize) -> WalletPool {
    let manager = WalletManager::from_key_list(&key_list(n)).unwrap();
    WalletPool::from_manager(&manager).unwrap()
}

pub fn address(i: usize) -> Address {
    KEYS[i].parse::<LocalWallet>().unwrap().address()
}

pub fn flush_config(n: usize, extra: &[(&str, &str)]) -> FlushConfig {
    let keys = key_list(n);
    let mut vars = config::Map::new();
    vars.insert("RPC_URL".to_string(), "http://localhost:8545".to_string());
    vars.insert("PRIVATE_KEYS".to_string(), keys);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    FlushConfig::from_vars(vars).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    Flush,
    Claim,
}

/// Scripted [`ChainClient`]. Every wallet succeeds unless told otherwise.
pub struct MockChain {
    pub gas_price: Mutex<U256>,
    pub eip1559: Mutex<Option<Eip1559Fees>>,
    pub slot_duration: u64,
    pub epoch_duration: u64,
    pub gas_estimate: U256,
    pub fail_fee_quote: Mutex<bool>,
    pub fail_epoch_duration: bool,
    pub fail_current_slot: bool,

    pub estimate_errors: Mutex<HashMap<Address, ChainError>>,
    pub send_errors: Mutex<HashMap<Address, ChainError>>,
    pub reverted_flushes: Mutex<HashSet<Address>>,
    pub dropped_flushes: Mutex<HashSet<Address>>,
    pub hanging_receipts: Mutex<HashSet<Address>>,
    pub panicking_estimates: Mutex<HashSet<Address>>,
    pub rewards: Mutex<HashMap<Address, U256>>,
    pub rewards_errors: Mutex<HashSet<Address>>,
    pub claim_error: Mutex<Option<ChainError>>,
    pub claim_reverts: Mutex<bool>,
    pub claim_panics: Mutex<bool>,

    pub sent: Mutex<HashMap<H256, (Address, SentKind)>>,
    pub flush_params: Mutex<Vec<(Address, TxParams)>>,
    pub next_hash: AtomicU64,

    pub estimate_calls: AtomicUsize,
    pub fee_quotes: AtomicUsize,
    pub flush_sends: AtomicUsize,
    pub claim_sends: AtomicUsize,
    pub rewards_reads: AtomicUsize,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            gas_price: Mutex::new(gwei(10)),
            eip1559: Mutex::new(Some(Eip1559Fees {
                max_fee_per_gas: gwei(20),
                max_priority_fee_per_gas: gwei(2),
            })),
            slot_duration: 36,
            epoch_duration: EPOCH,
            gas_estimate: U256::from(100_000u64),
            fail_fee_quote: Mutex::new(false),
            fail_epoch_duration: false,
            fail_current_slot: false,
            estimate_errors: Mutex::default(),
            send_errors: Mutex::default(),
            reverted_flushes: Mutex::default(),
            dropped_flushes: Mutex::default(),
            hanging_receipts: Mutex::default(),
            panicking_estimates: Mutex::default(),
            rewards: Mutex::default(),
            rewards_errors: Mutex::default(),
            claim_error: Mutex::new(None),
            claim_reverts: Mutex::new(false),
            claim_panics: Mutex::new(false),
            sent: Mutex::default(),
            flush_params: Mutex::default(),
            next_hash: AtomicU64::new(1),
            estimate_calls: AtomicUsize::new(0),
            fee_quotes: AtomicUsize::new(0),
            flush_sends: AtomicUsize::new(0),
            claim_sends: AtomicUsize::new(0),
            rewards_reads: AtomicUsize::new(0),
        }
    }
}

impl MockChain {
    pub fn set_gas_price(&self, price: U256) {
        *self.gas_price.lock().unwrap() = price;
    }

    pub fn fail_estimate(&self, who: Address, err: ChainError) {
        self.estimate_errors.lock().unwrap().insert(who, err);
    }

    pub fn fail_send(&self, who: Address, err: ChainError) {
        self.send_errors.lock().unwrap().insert(who, err);
    }

    pub fn revert_flush(&self, who: Address) {
        self.reverted_flushes.lock().unwrap().insert(who);
    }

    pub fn drop_flush(&self, who: Address) {
        self.dropped_flushes.lock().unwrap().insert(who);
    }

    pub fn hang_receipt(&self, who: Address) {
        self.hanging_receipts.lock().unwrap().insert(who);
    }

    pub fn panic_on_estimate(&self, who: Address) {
        self.panicking_estimates.lock().unwrap().insert(who);
    }

    pub fn set_rewards(&self, who: Address, amount: U256) {
        self.rewards.lock().unwrap().insert(who, amount);
    }

    pub fn fail_rewards(&self, who: Address) {
        self.rewards_errors.lock().unwrap().insert(who);
    }

    pub fn fail_claim(&self, err: ChainError) {
        *self.claim_error.lock().unwrap() = Some(err);
    }

    pub fn revert_claims(&self) {
        *self.claim_reverts.lock().unwrap() = true;
    }

    pub fn panic_on_claim(&self) {
        *self.claim_panics.lock().unwrap() = true;
    }

    fn record_sent(&self, who: Address, kind: SentKind) -> H256 {
        let hash = H256::from_low_u64_be(self.next_hash.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().unwrap().insert(hash, (who, kind));
        hash
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn fee_quote(&self) -> Result<FeeQuote, ChainError> {
        self.fee_quotes.fetch_add(1, Ordering::SeqCst);
        if *self.fail_fee_quote.lock().unwrap() {
            return Err(ChainError::network("error sending request: connection refused"));
        }
        Ok(FeeQuote {
            gas_price: *self.gas_price.lock().unwrap(),
            eip1559: *self.eip1559.lock().unwrap(),
        })
    }

    async fn native_balance(&self, _address: Address) -> Result<U256, ChainError> {
        Ok(tokens(1))
    }

    async fn slot_duration(&self) -> Result<u64, ChainError> {
        Ok(self.slot_duration)
    }

    async fn epoch_duration(&self) -> Result<u64, ChainError> {
        if self.fail_epoch_duration {
            return Err(ChainError::network("request timed out"));
        }
        Ok(self.epoch_duration)
    }

    async fn current_slot(&self) -> Result<u64, ChainError> {
        if self.fail_current_slot {
            return Err(ChainError::network("request timed out"));
        }
        Ok(123_456)
    }

    async fn rewards_of(&self, address: Address) -> Result<U256, ChainError> {
        self.rewards_reads.fetch_add(1, Ordering::SeqCst);
        if self.rewards_errors.lock().unwrap().contains(&address) {
            return Err(ChainError::network("request timed out"));
        }
        Ok(self
            .rewards
            .lock()
            .unwrap()
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn rewards_available(&self) -> Result<U256, ChainError> {
        Ok(tokens(1_000_000))
    }

    async fn estimate_flush_gas(&self, signer: &LocalWallet) -> Result<U256, ChainError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        let who = signer.address();
        if self.panicking_estimates.lock().unwrap().contains(&who) {
            panic!("estimate exploded for {:?}", who);
        }
        if let Some(err) = self.estimate_errors.lock().unwrap().get(&who) {
            return Err(err.clone());
        }
        Ok(self.gas_estimate)
    }

    async fn send_flush(&self, signer: &LocalWallet, params: TxParams) -> Result<H256, ChainError> {
        let who = signer.address();
        if let Some(err) = self.send_errors.lock().unwrap().get(&who) {
            return Err(err.clone());
        }
        self.flush_sends.fetch_add(1, Ordering::SeqCst);
        self.flush_params.lock().unwrap().push((who, params));
        Ok(self.record_sent(who, SentKind::Flush))
    }

    async fn send_claim(&self, signer: &LocalWallet) -> Result<H256, ChainError> {
        self.claim_sends.fetch_add(1, Ordering::SeqCst);
        if *self.claim_panics.lock().unwrap() {
            panic!("claim exploded for {:?}", signer.address());
        }
        if let Some(err) = self.claim_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.record_sent(signer.address(), SentKind::Claim))
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, ChainError> {
        let (who, kind) = self
            .sent
            .lock()
            .unwrap()
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| ChainError::invalid_response("unknown transaction"))?;

        let success = match kind {
            SentKind::Flush => {
                let hangs = self.hanging_receipts.lock().unwrap().contains(&who);
                if hangs {
                    std::future::pending::<()>().await;
                }
                if self.dropped_flushes.lock().unwrap().contains(&who) {
                    return Ok(None);
                }
                !self.reverted_flushes.lock().unwrap().contains(&who)
            }
            SentKind::Claim => !*self.claim_reverts.lock().unwrap(),
        };

        Ok(Some(TxReceipt {
            tx_hash,
            success,
            gas_used: U256::from(80_000u64),
            effective_gas_price: Some(gwei(10)),
        }))
    }
}
