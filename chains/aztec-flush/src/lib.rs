//! # Aztec Flush Agent
//!
//! Flushes the rollup's validator entry queue once per epoch, racing other
//! operators with a pool of funded wallets.
//!
//! ## Modules
//!
//! - [`config`] - Environment configuration
//! - [`chain`] - RPC capability trait and the ethers implementation
//! - [`epoch`] - Epoch arithmetic and boundary waits
//! - [`gas`] - Fee ceiling and transaction gas parameters
//! - [`wallet_pool`] - Wallets with per-wallet outcome counters
//! - [`submitter`] - Single flush attempt and outcome classification
//! - [`rewards`] - Reward balance reporting
//! - [`orchestrator`] - Control loop and campaign fan-out

pub mod chain;
pub mod config;
pub mod epoch;
pub mod error;
pub mod gas;
pub mod orchestrator;
pub mod rewards;
pub mod submitter;
pub mod wallet_pool;

pub use chain::{ChainClient, EthersChain};
pub use crate::config::FlushConfig;
pub use epoch::{Clock, EpochTracker, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use epoch::TokioClock;
pub use error::{ChainError, ChainErrorKind};
pub use gas::GasGate;
pub use orchestrator::{CampaignResult, CycleOutcome, FlushOrchestrator};
pub use rewards::RewardsMonitor;
pub use submitter::{FailureReason, SkipReason, SubmissionOutcome, TransactionSubmitter};
pub use wallet_pool::{WalletCredential, WalletPool, WalletStats};
