use crate::chain::ChainClient;
use crate::config::FlushConfig;
use crate::epoch::{Clock, EpochTracker};
use crate::gas::{format_gwei, GasGate};
use crate::rewards::RewardsMonitor;
use crate::submitter::{FailureReason, SubmissionOutcome, TransactionSubmitter};
use crate::wallet_pool::{short_address, WalletPool};
use anyhow::{Context, Result};
use core_logic::{sleep_or_cancel, AttemptClass, MetricsCollector};
use ethers::types::U256;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Settled result of one campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignResult {
    pub attempted: usize,
    pub succeeded: usize,
    /// One outcome per wallet, in pool order.
    pub outcomes: Vec<SubmissionOutcome>,
}

/// What a single wake-up did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A campaign for this epoch already ran.
    AlreadyFlushed,
    /// Fee above the ceiling; no wallet was touched.
    Skipped { gas_price: U256 },
    Completed(CampaignResult),
}

/// Owns the control loop and the per-epoch campaign guard.
pub struct FlushOrchestrator {
    client: Arc<dyn ChainClient>,
    pool: Arc<WalletPool>,
    submitter: Arc<TransactionSubmitter>,
    tracker: EpochTracker,
    gate: GasGate,
    rewards: RewardsMonitor,
    metrics: Arc<MetricsCollector>,
    metrics_path: Option<String>,
    loop_backoff: Duration,
    /// Highest epoch a campaign ran for; `None` before any.
    last_flushed_epoch: Option<u64>,
}

impl FlushOrchestrator {
    pub fn new(
        client: Arc<dyn ChainClient>,
        pool: Arc<WalletPool>,
        clock: Arc<dyn Clock>,
        config: &FlushConfig,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        let submitter = Arc::new(TransactionSubmitter::from_config(
            client.clone(),
            config,
            metrics.clone(),
        ));
        let tracker = EpochTracker::new(
            client.clone(),
            clock,
            config.epoch_duration_seconds,
            Duration::from_secs(config.flush_offset_seconds),
        );

        Self {
            rewards: RewardsMonitor::new(client.clone()),
            gate: GasGate::new(config.max_gas_price),
            metrics_path: config.metrics_path.clone(),
            loop_backoff: config.loop_backoff,
            last_flushed_epoch: None,
            client,
            pool,
            submitter,
            tracker,
            metrics,
        }
    }

    pub fn pool(&self) -> &WalletPool {
        &self.pool
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn tracker(&self) -> &EpochTracker {
        &self.tracker
    }

    pub fn last_flushed_epoch(&self) -> Option<u64> {
        self.last_flushed_epoch
    }

    /// Startup sequence. Errors here are fatal for the process.
    ///
    /// The guard starts at the epoch before the current one, so the first
    /// boundary reached is eligible.
    pub async fn initialize(&mut self) -> Result<u64> {
        info!("🤖 Aztec Flush Rewarder Agent Starting...");
        info!("{}", "━".repeat(60));

        self.rewards.log_native_balances(self.pool.wallets()).await;

        let current = self
            .tracker
            .initialize()
            .await
            .context("Failed to initialize epoch tracker")?;
        self.last_flushed_epoch = current.checked_sub(1);

        self.rewards.log_rewards_available().await;

        info!("{}", "━".repeat(60));
        info!("✅ Agent initialized successfully!");
        info!(
            "🎯 {} wallet(s), gas ceiling {} gwei",
            self.pool.len(),
            format_gwei(self.gate.ceiling())
        );
        info!("{}", "━".repeat(60));

        self.rewards.check_all(self.pool.wallets()).await;
        Ok(current)
    }

    /// [`initialize`](Self::initialize), abandoned if `shutdown` fires first.
    ///
    /// Returns `Ok(false)` when startup was interrupted; the shutdown report
    /// has already run in that case.
    pub async fn start(&mut self, shutdown: &CancellationToken) -> Result<bool> {
        let started = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            result = self.initialize() => Some(result),
        };

        match started {
            Some(result) => result.map(|_| true),
            None => {
                warn!("Interrupted during startup");
                self.shutdown().await;
                Ok(false)
            }
        }
    }

    /// Runs until `shutdown` is cancelled, then performs the shutdown report.
    ///
    /// A campaign already in flight always settles before the token is
    /// observed again.
    pub async fn run(&mut self, shutdown: &CancellationToken) {
        loop {
            if self.tracker.wait_for_next_epoch(shutdown).await.is_none() {
                break;
            }

            let epoch = self.tracker.current_epoch();
            if let Err(e) = self.run_cycle(epoch).await {
                error!("❌ Error in main loop: {:#}", e);
                self.metrics.record_loop_error();
                if !sleep_or_cancel(self.loop_backoff, shutdown).await {
                    break;
                }
                continue;
            }

            self.log_wallet_stats();
        }

        self.shutdown().await;
    }

    /// Handles one wake-up for `epoch`.
    ///
    /// Errors are loop-level failures (for example the fee quote could not be
    /// fetched); the guard is left untouched in that case.
    pub async fn run_cycle(&mut self, epoch: u64) -> Result<CycleOutcome> {
        info!("{}", "═".repeat(60));
        info!("🆕 NEW EPOCH {} - FLUSH WINDOW OPEN", epoch);
        info!("{}", "═".repeat(60));

        if self.last_flushed_epoch.is_some_and(|last| epoch <= last) {
            info!("ℹ️  Already flushed this epoch, waiting for next...");
            return Ok(CycleOutcome::AlreadyFlushed);
        }

        info!("🚀 Attempting flush with {} wallet(s)...", self.pool.len());

        let quote = self
            .client
            .fee_quote()
            .await
            .context("Failed to fetch fee data")?;
        info!("⛽ Current Gas Price: {} gwei", format_gwei(quote.gas_price));

        if !self.gate.should_proceed(quote.gas_price) {
            info!(
                "⚠️  Gas price too high ({} > {} gwei), SKIPPED this epoch",
                format_gwei(quote.gas_price),
                format_gwei(self.gate.ceiling())
            );
            self.metrics.record_gas_skip();
            return Ok(CycleOutcome::Skipped {
                gas_price: quote.gas_price,
            });
        }

        let result = self.run_campaign().await;
        self.last_flushed_epoch = Some(epoch);

        info!(
            "📈 Result: {}/{} wallet(s) successfully flushed",
            result.succeeded, result.attempted
        );
        self.metrics.record_campaign(result.succeeded);

        self.rewards.check_all(self.pool.wallets()).await;
        self.export_metrics().await;

        Ok(CycleOutcome::Completed(result))
    }

    /// One attempt per wallet, all concurrent, all awaited.
    ///
    /// Each attempt runs in its own task, so a panic in one wallet's attempt
    /// surfaces as a join error for that wallet only.
    async fn run_campaign(&self) -> CampaignResult {
        let handles: Vec<JoinHandle<SubmissionOutcome>> = (0..self.pool.len())
            .map(|index| {
                let pool = self.pool.clone();
                let submitter = self.submitter.clone();
                tokio::spawn(async move {
                    let wallet = &pool.wallets()[index];
                    submitter.attempt(&pool, wallet).await
                })
            })
            .collect();

        let outcomes: Vec<SubmissionOutcome> = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => self.abandoned_attempt(index, &e.to_string()),
            })
            .collect();

        CampaignResult {
            attempted: outcomes.len(),
            succeeded: outcomes.iter().filter(|o| o.is_success()).count(),
            outcomes,
        }
    }

    /// Settles an attempt whose task died before classifying itself.
    fn abandoned_attempt(&self, index: usize, reason: &str) -> SubmissionOutcome {
        let wallet = &self.pool.wallets()[index];
        error!("   [{}] ❌ FAILED: attempt aborted: {}", wallet.label(), reason);

        if let Err(e) = self.pool.record_failure(wallet.address()) {
            error!("   [{}] Could not record outcome: {}", wallet.label(), e);
        }
        self.metrics
            .record_attempt(AttemptClass::Failure, Duration::ZERO);

        SubmissionOutcome::Failure(FailureReason::Other(format!("attempt aborted: {}", reason)))
    }

    pub fn log_wallet_stats(&self) {
        info!("📊 Wallet Performance:");
        for (i, s) in self.pool.stats().iter().enumerate() {
            info!(
                "   [{}] {}: {} ✅ / {} ❌ ({:.1}%)",
                i + 1,
                short_address(&s.address),
                s.successes,
                s.failures,
                s.success_rate * 100.0
            );
        }
    }

    /// Final rewards check and summary after an interrupt.
    pub async fn shutdown(&self) {
        info!("👋 Shutting down agent...");

        self.rewards.check_all(self.pool.wallets()).await;
        self.log_wallet_stats();
        info!(
            "📈 Overall success rate: {:.1}% over {} attempt(s), {} campaign(s)",
            self.pool.overall_success_rate() * 100.0,
            self.metrics.attempts_total(),
            self.metrics.campaigns_run()
        );

        self.export_metrics().await;
    }

    async fn export_metrics(&self) {
        if let Some(path) = &self.metrics_path {
            if let Err(e) = self.metrics.export_to_file(path).await {
                warn!("Failed to write metrics to {}: {}", path, e);
            }
        }
    }
}
