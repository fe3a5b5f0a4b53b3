use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Coarse outcome class of a single wallet attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptClass {
    Success,
    BenignSkip,
    Failure,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_secs: u64,
    pub attempts: AttemptMetrics,
    pub campaigns: CampaignMetrics,
    pub latency: LatencyMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptMetrics {
    pub total: u64,
    pub success: u64,
    pub benign_skip: u64,
    pub failed: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignMetrics {
    pub run: u64,
    pub with_success: u64,
    pub skipped_for_gas: u64,
    pub loop_errors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyMetrics {
    pub avg_attempt_ms: f64,
    pub min_attempt_ms: u64,
    pub max_attempt_ms: u64,
}

/// Process-lifetime counters for the flush agent.
///
/// All counters are atomics so concurrent wallet attempts can record without
/// coordination.
#[derive(Debug)]
pub struct MetricsCollector {
    attempts_success: AtomicU64,
    attempts_skipped: AtomicU64,
    attempts_failed: AtomicU64,
    attempt_duration_sum_ms: AtomicU64,
    attempt_min_duration_ms: AtomicU64,
    attempt_max_duration_ms: AtomicU64,
    campaigns_run: AtomicU64,
    campaigns_with_success: AtomicU64,
    epochs_skipped_for_gas: AtomicU64,
    loop_errors: AtomicU64,
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            attempts_success: AtomicU64::new(0),
            attempts_skipped: AtomicU64::new(0),
            attempts_failed: AtomicU64::new(0),
            attempt_duration_sum_ms: AtomicU64::new(0),
            attempt_min_duration_ms: AtomicU64::new(u64::MAX),
            attempt_max_duration_ms: AtomicU64::new(0),
            campaigns_run: AtomicU64::new(0),
            campaigns_with_success: AtomicU64::new(0),
            epochs_skipped_for_gas: AtomicU64::new(0),
            loop_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self, class: AttemptClass, duration: Duration) {
        let counter = match class {
            AttemptClass::Success => &self.attempts_success,
            AttemptClass::BenignSkip => &self.attempts_skipped,
            AttemptClass::Failure => &self.attempts_failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);

        let duration_ms = duration.as_millis() as u64;
        self.attempt_duration_sum_ms
            .fetch_add(duration_ms, Ordering::SeqCst);
        self.attempt_min_duration_ms
            .fetch_min(duration_ms, Ordering::SeqCst);
        self.attempt_max_duration_ms
            .fetch_max(duration_ms, Ordering::SeqCst);
    }

    pub fn record_campaign(&self, succeeded: usize) {
        self.campaigns_run.fetch_add(1, Ordering::SeqCst);
        if succeeded > 0 {
            self.campaigns_with_success.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_gas_skip(&self) {
        self.epochs_skipped_for_gas.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_loop_error(&self) {
        self.loop_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn attempts_total(&self) -> u64 {
        self.attempts_success.load(Ordering::SeqCst)
            + self.attempts_skipped.load(Ordering::SeqCst)
            + self.attempts_failed.load(Ordering::SeqCst)
    }

    pub fn campaigns_run(&self) -> u64 {
        self.campaigns_run.load(Ordering::SeqCst)
    }

    pub fn epochs_skipped_for_gas(&self) -> u64 {
        self.epochs_skipped_for_gas.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let success = self.attempts_success.load(Ordering::SeqCst);
        let total = self.attempts_total();
        let duration_sum = self.attempt_duration_sum_ms.load(Ordering::SeqCst);
        let min_duration = self.attempt_min_duration_ms.load(Ordering::SeqCst);

        MetricsSnapshot {
            timestamp: Utc::now().to_rfc3339(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            attempts: AttemptMetrics {
                total,
                success,
                benign_skip: self.attempts_skipped.load(Ordering::SeqCst),
                failed: self.attempts_failed.load(Ordering::SeqCst),
                success_rate: if total > 0 {
                    success as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            },
            campaigns: CampaignMetrics {
                run: self.campaigns_run(),
                with_success: self.campaigns_with_success.load(Ordering::SeqCst),
                skipped_for_gas: self.epochs_skipped_for_gas(),
                loop_errors: self.loop_errors.load(Ordering::SeqCst),
            },
            latency: LatencyMetrics {
                avg_attempt_ms: if total > 0 {
                    duration_sum as f64 / total as f64
                } else {
                    0.0
                },
                min_attempt_ms: if min_duration == u64::MAX {
                    0
                } else {
                    min_duration
                },
                max_attempt_ms: self.attempt_max_duration_ms.load(Ordering::SeqCst),
            },
        }
    }

    pub fn to_json(&self) -> String {
        let snapshot = self.snapshot();
        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }

    pub async fn export_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json();
        tokio::fs::write(path, json).await
    }
}
