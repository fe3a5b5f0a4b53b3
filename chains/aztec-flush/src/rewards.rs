use crate::chain::ChainClient;
use crate::wallet_pool::{short_address, WalletCredential};
use ethers::types::{Address, U256};
use ethers::utils::format_ether;
use std::sync::Arc;
use tracing::{info, warn};

/// Read-only view of accrued rewards. Nothing here affects scheduling.
pub struct RewardsMonitor {
    client: Arc<dyn ChainClient>,
}

impl RewardsMonitor {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Logs every non-zero reward balance. A failed read is logged against
    /// that wallet and the sweep moves on.
    ///
    /// Returns the balances that could be read.
    pub async fn check_all(&self, wallets: &[WalletCredential]) -> Vec<(Address, U256)> {
        info!("🎁 Checking rewards across all wallets...");

        let mut balances = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let address = wallet.address();
            match self.client.rewards_of(address).await {
                Ok(rewards) => {
                    if !rewards.is_zero() {
                        info!(
                            "   [{}] {}: {} AZTEC",
                            wallet.label(),
                            short_address(&address),
                            format_ether(rewards)
                        );
                    }
                    balances.push((address, rewards));
                }
                Err(e) => warn!("   [{}] Error checking rewards: {}", wallet.label(), e),
            }
        }
        balances
    }

    /// Logs the rewarder's remaining pool. Returns `None` if the read failed.
    pub async fn log_rewards_available(&self) -> Option<U256> {
        match self.client.rewards_available().await {
            Ok(available) => {
                info!("💰 Rewards available in pool: {} AZTEC", format_ether(available));
                Some(available)
            }
            Err(e) => {
                warn!("Could not read rewards available: {}", e);
                None
            }
        }
    }

    /// Logs each wallet's native balance at startup.
    pub async fn log_native_balances(&self, wallets: &[WalletCredential]) {
        info!("👛 Loaded {} wallet(s):", wallets.len());
        for wallet in wallets {
            let address = wallet.address();
            match self.client.native_balance(address).await {
                Ok(balance) => info!("   {:?}: {} ETH", address, format_ether(balance)),
                Err(e) => warn!("   {:?}: balance unavailable ({})", address, e),
            }
        }
    }
}
