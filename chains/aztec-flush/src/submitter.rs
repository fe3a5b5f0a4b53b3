use crate::chain::{ChainClient, TxReceipt};
use crate::config::FlushConfig;
use crate::error::{ChainError, ChainErrorKind};
use crate::gas;
use crate::wallet_pool::{WalletCredential, WalletPool};
use core_logic::{AttemptClass, MetricsCollector};
use ethers::types::{H256, U256};
use ethers::utils::format_ether;
use futures::FutureExt;
use rand::Rng;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Longest error text carried in a [`FailureReason::Other`].
pub const MAX_ERROR_MESSAGE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A competitor flushed the queue first.
    AlreadyFlushed,
    /// Outbid and replaced by a faster transaction.
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Estimation(String),
    OnChainRevert,
    /// The node forgot the transaction before it was mined.
    Dropped,
    Timeout,
    Other(String),
}

/// Terminal classification of one wallet attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success {
        tx_hash: H256,
        gas_used: U256,
        cost: U256,
    },
    BenignSkip(SkipReason),
    Failure(FailureReason),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn class(&self) -> AttemptClass {
        match self {
            SubmissionOutcome::Success { .. } => AttemptClass::Success,
            SubmissionOutcome::BenignSkip(_) => AttemptClass::BenignSkip,
            SubmissionOutcome::Failure(_) => AttemptClass::Failure,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyFlushed => write!(f, "queue already flushed by a competitor"),
            SkipReason::Replaced => write!(f, "transaction replaced by a faster one"),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Estimation(msg) => write!(f, "gas estimation failed: {}", msg),
            FailureReason::OnChainRevert => write!(f, "transaction reverted on chain"),
            FailureReason::Dropped => write!(f, "transaction dropped before inclusion"),
            FailureReason::Timeout => write!(f, "attempt deadline exceeded"),
            FailureReason::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Cuts `message` to [`MAX_ERROR_MESSAGE_CHARS`] characters.
pub fn truncate_message(message: &str) -> String {
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}

/// Benign race outcomes, shared by the estimation and broadcast stages.
fn benign_skip(err: &ChainError) -> Option<SkipReason> {
    match err.kind {
        ChainErrorKind::AlreadyFlushed | ChainErrorKind::Reverted => {
            Some(SkipReason::AlreadyFlushed)
        }
        ChainErrorKind::Underpriced => Some(SkipReason::Replaced),
        _ => None,
    }
}

fn classify_estimation_error(err: &ChainError) -> SubmissionOutcome {
    match benign_skip(err) {
        Some(reason) => SubmissionOutcome::BenignSkip(reason),
        None => SubmissionOutcome::Failure(FailureReason::Estimation(truncate_message(
            &err.message,
        ))),
    }
}

fn classify_send_error(err: &ChainError) -> SubmissionOutcome {
    match benign_skip(err) {
        Some(reason) => SubmissionOutcome::BenignSkip(reason),
        None => SubmissionOutcome::Failure(FailureReason::Other(truncate_message(&err.message))),
    }
}

/// Runs single flush attempts for one wallet at a time.
pub struct TransactionSubmitter {
    client: Arc<dyn ChainClient>,
    claim_threshold: U256,
    max_jitter: Duration,
    attempt_timeout: Duration,
    metrics: Arc<MetricsCollector>,
}

impl TransactionSubmitter {
    pub fn new(
        client: Arc<dyn ChainClient>,
        claim_threshold: U256,
        max_jitter: Duration,
        attempt_timeout: Duration,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            client,
            claim_threshold,
            max_jitter,
            attempt_timeout,
            metrics,
        }
    }

    pub fn from_config(
        client: Arc<dyn ChainClient>,
        config: &FlushConfig,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self::new(
            client,
            config.claim_threshold,
            config.max_jitter,
            config.attempt_timeout,
            metrics,
        )
    }

    /// Performs one flush attempt with `wallet` and records exactly one
    /// counter update on `pool`.
    ///
    /// A successful flush may be followed by a reward claim; the claim's own
    /// result never changes the returned outcome.
    pub async fn attempt(&self, pool: &WalletPool, wallet: &WalletCredential) -> SubmissionOutcome {
        let label = wallet.label();
        let started = Instant::now();

        self.jitter().await;

        let outcome = match tokio::time::timeout(self.attempt_timeout, self.flush(wallet)).await {
            Ok(outcome) => outcome,
            Err(_) => SubmissionOutcome::Failure(FailureReason::Timeout),
        };

        match &outcome {
            SubmissionOutcome::Success {
                tx_hash,
                gas_used,
                cost,
            } => {
                info!("   [{}] ✅ SUCCESS! {:?}", label, tx_hash);
                info!("   [{}] ⛽ Gas Used: {}", label, gas_used);
                info!("   [{}] 💰 Cost: {} ETH", label, format_ether(*cost));
            }
            SubmissionOutcome::BenignSkip(reason) => {
                info!("   [{}] ℹ️  SKIPPED: {}", label, reason);
            }
            SubmissionOutcome::Failure(reason) => {
                warn!("   [{}] ❌ FAILED: {}", label, reason);
            }
        }

        let recorded = if outcome.is_success() {
            pool.record_success(wallet.address())
        } else {
            pool.record_failure(wallet.address())
        };
        if let Err(e) = recorded {
            error!("   [{}] Could not record outcome: {}", label, e);
        }
        self.metrics.record_attempt(outcome.class(), started.elapsed());

        if outcome.is_success() {
            let claim = AssertUnwindSafe(self.claim_if_due(wallet)).catch_unwind();
            if claim.await.is_err() {
                error!("   [{}] Claim step panicked, flush result kept", label);
            }
        }

        outcome
    }

    async fn jitter(&self) {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(0..=max_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    async fn flush(&self, wallet: &WalletCredential) -> SubmissionOutcome {
        let label = wallet.label();

        info!("   [{}] Estimating gas...", label);
        let estimate = match self.client.estimate_flush_gas(wallet.signer()).await {
            Ok(estimate) => estimate,
            Err(e) => return classify_estimation_error(&e),
        };

        let quote = match self.client.fee_quote().await {
            Ok(quote) => quote,
            Err(e) => {
                return SubmissionOutcome::Failure(FailureReason::Other(truncate_message(
                    &e.message,
                )))
            }
        };
        let params = gas::tx_params(estimate, &quote);

        info!("   [{}] 📤 Sending transaction...", label);
        let tx_hash = match self.client.send_flush(wallet.signer(), params).await {
            Ok(hash) => hash,
            Err(e) => return classify_send_error(&e),
        };
        info!("   [{}] 🔗 TX: {:?}", label, tx_hash);

        match self.client.wait_for_receipt(tx_hash).await {
            Ok(Some(receipt)) => settle_receipt(receipt, quote.gas_price),
            Ok(None) => SubmissionOutcome::Failure(FailureReason::Dropped),
            Err(e) => classify_send_error(&e),
        }
    }

    async fn claim_if_due(&self, wallet: &WalletCredential) {
        let label = wallet.label();

        let rewards = match self.client.rewards_of(wallet.address()).await {
            Ok(rewards) => rewards,
            Err(e) => {
                warn!("   [{}] Could not read rewards before claim: {}", label, e);
                return;
            }
        };
        if rewards <= self.claim_threshold {
            return;
        }

        info!(
            "   [{}] 💎 Auto-claiming {} AZTEC...",
            label,
            format_ether(rewards)
        );

        let claim = async {
            let tx_hash = self.client.send_claim(wallet.signer()).await?;
            self.client.wait_for_receipt(tx_hash).await
        };

        match tokio::time::timeout(self.attempt_timeout, claim).await {
            Ok(Ok(Some(receipt))) if receipt.success => {
                info!("   [{}] ✅ Rewards claimed!", label)
            }
            Ok(Ok(Some(_))) => warn!("   [{}] Claim transaction reverted", label),
            Ok(Ok(None)) => warn!("   [{}] Claim transaction was dropped", label),
            Ok(Err(e)) => warn!("   [{}] Claim failed: {}", label, e),
            Err(_) => warn!("   [{}] Claim timed out", label),
        }
    }
}

fn settle_receipt(receipt: TxReceipt, quoted_gas_price: U256) -> SubmissionOutcome {
    if !receipt.success {
        return SubmissionOutcome::Failure(FailureReason::OnChainRevert);
    }
    let gas_price = receipt.effective_gas_price.unwrap_or(quoted_gas_price);
    SubmissionOutcome::Success {
        tx_hash: receipt.tx_hash,
        gas_used: receipt.gas_used,
        cost: receipt.gas_used.saturating_mul(gas_price),
    }
}
