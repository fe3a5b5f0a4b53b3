//! Epoch arithmetic and boundary-aligned waiting.
//!
//! Epochs are derived from wall-clock time: `epoch = floor(now / duration)`.
//! The duration starts at the configured fallback and is replaced by the
//! rollup's own value in [`EpochTracker::initialize`].

use crate::chain::ChainClient;
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Longest sleep between two progress notifications.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Source of wall-clock seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock anchored at a fixed unix time that advances with tokio's timer.
///
/// Under a paused tokio runtime this makes waits fully deterministic.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base_unix: u64,
    started: Instant,
}

#[cfg(any(test, feature = "testing"))]
impl TokioClock {
    pub fn starting_at(base_unix: u64) -> Self {
        Self {
            base_unix,
            started: Instant::now(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for TokioClock {
    fn now_unix(&self) -> u64 {
        self.base_unix + self.started.elapsed().as_secs()
    }
}

pub fn epoch_at(now_unix: u64, epoch_duration: u64) -> u64 {
    now_unix / epoch_duration
}

/// Seconds from `now_unix` to the start of the following epoch.
///
/// At an exact boundary the current epoch has just opened, so the result is
/// the full duration; it is always in `1..=epoch_duration`.
pub fn seconds_until_next_epoch_at(now_unix: u64, epoch_duration: u64) -> u64 {
    let next_epoch_start = (epoch_at(now_unix, epoch_duration) + 1) * epoch_duration;
    next_epoch_start - now_unix
}

pub struct EpochTracker {
    client: Arc<dyn ChainClient>,
    clock: Arc<dyn Clock>,
    epoch_duration: u64,
    slot_duration: Option<u64>,
    flush_offset: Duration,
}

impl EpochTracker {
    pub fn new(
        client: Arc<dyn ChainClient>,
        clock: Arc<dyn Clock>,
        fallback_epoch_duration: u64,
        flush_offset: Duration,
    ) -> Self {
        Self {
            client,
            clock,
            epoch_duration: fallback_epoch_duration.max(1),
            slot_duration: None,
            flush_offset,
        }
    }

    /// Fetches slot and epoch durations from the rollup and returns the
    /// current epoch. Failure here leaves no valid schedule and is fatal.
    pub async fn initialize(&mut self) -> Result<u64> {
        info!("🔍 Initializing epoch tracker...");

        let slot_duration = self
            .client
            .slot_duration()
            .await
            .context("Failed to fetch slot duration")?;
        let epoch_duration = self
            .client
            .epoch_duration()
            .await
            .context("Failed to fetch epoch duration")?;

        if epoch_duration == 0 {
            bail!("Rollup reported an epoch duration of zero");
        }

        self.slot_duration = Some(slot_duration);
        self.epoch_duration = epoch_duration;

        info!("📊 Slot Duration: {} seconds", slot_duration);
        info!("📊 Epoch Duration: {} seconds", epoch_duration);

        match self.client.current_slot().await {
            Ok(slot) => info!("📊 Current Slot: {}", slot),
            Err(e) => warn!("Could not read current slot: {}", e),
        }

        let current = self.current_epoch();
        info!("📊 Current Epoch: {}", current);
        Ok(current)
    }

    pub fn epoch_duration(&self) -> u64 {
        self.epoch_duration
    }

    pub fn slot_duration(&self) -> Option<u64> {
        self.slot_duration
    }

    pub fn flush_offset(&self) -> Duration {
        self.flush_offset
    }

    pub fn current_epoch(&self) -> u64 {
        epoch_at(self.clock.now_unix(), self.epoch_duration)
    }

    pub fn seconds_until_next_epoch(&self) -> u64 {
        seconds_until_next_epoch_at(self.clock.now_unix(), self.epoch_duration)
    }

    /// Sleeps until the next boundary plus the flush offset.
    ///
    /// Progress is logged at least every [`PROGRESS_INTERVAL`]. The deadline is
    /// fixed up front, so the wait never ends before it. Returns the number of
    /// progress notifications emitted, or `None` if `shutdown` fired first.
    pub async fn wait_for_next_epoch(&self, shutdown: &CancellationToken) -> Option<u32> {
        let total = Duration::from_secs(self.seconds_until_next_epoch()) + self.flush_offset;
        let deadline = Instant::now() + total;
        info!("⏳ Waiting {} seconds until flush window...", total.as_secs());

        let mut notifications = 0;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let step = (deadline - now).min(PROGRESS_INTERVAL);
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep_until(now + step) => {}
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if !remaining.is_zero() {
                let secs = remaining.as_secs();
                info!("   ⏰ {}m {}s remaining...", secs / 60, secs % 60);
                notifications += 1;
            }
        }

        Some(notifications)
    }
}
