//! # Chain access
//!
//! [`ChainClient`] is everything the agent needs from the RPC endpoint and the
//! two target contracts. [`EthersChain`] is the production implementation;
//! tests drive the scheduling core with scripted clients.

use crate::error::ChainError;
use async_trait::async_trait;
use ethers::signers::LocalWallet;
use ethers::types::{Address, H256, U256};

pub mod ethers_client;
pub use ethers_client::EthersChain;

/// Current fee data as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// Legacy gas price; this is what the campaign gas gate compares.
    pub gas_price: U256,
    /// Present only when the chain supports EIP-1559 transactions.
    pub eip1559: Option<Eip1559Fees>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip1559Fees {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Fee fields attached to an outgoing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeFields {
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
    Legacy {
        gas_price: U256,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    pub gas_limit: U256,
    pub fees: FeeFields,
}

/// Mined transaction as far as the agent cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub success: bool,
    pub gas_used: U256,
    pub effective_gas_price: Option<U256>,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn fee_quote(&self) -> Result<FeeQuote, ChainError>;

    async fn native_balance(&self, address: Address) -> Result<U256, ChainError>;

    // Rollup parameters
    async fn slot_duration(&self) -> Result<u64, ChainError>;
    async fn epoch_duration(&self) -> Result<u64, ChainError>;
    async fn current_slot(&self) -> Result<u64, ChainError>;

    // Flush rewarder reads
    async fn rewards_of(&self, address: Address) -> Result<U256, ChainError>;
    async fn rewards_available(&self) -> Result<U256, ChainError>;

    // Flush rewarder writes
    async fn estimate_flush_gas(&self, signer: &LocalWallet) -> Result<U256, ChainError>;
    async fn send_flush(&self, signer: &LocalWallet, params: TxParams) -> Result<H256, ChainError>;
    /// Sends `claimRewards()` with node-filled gas and fee fields.
    async fn send_claim(&self, signer: &LocalWallet) -> Result<H256, ChainError>;

    /// Waits until `tx_hash` is mined. `Ok(None)` means the node dropped it.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, ChainError>;
}
