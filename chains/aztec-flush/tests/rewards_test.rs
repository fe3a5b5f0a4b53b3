mod common;

use aztec_flush::RewardsMonitor;
use common::{address, pool, tokens, MockChain};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_check_all_reports_every_readable_wallet() {
    let chain = Arc::new(MockChain::default());
    chain.set_rewards(address(0), tokens(3));
    chain.set_rewards(address(2), tokens(9));
    let pool = pool(3);

    let balances = RewardsMonitor::new(chain.clone()).check_all(pool.wallets()).await;

    assert_eq!(
        balances,
        vec![
            (address(0), tokens(3)),
            (address(1), tokens(0)),
            (address(2), tokens(9)),
        ]
    );
}

#[tokio::test]
async fn test_failed_read_does_not_stop_the_sweep() {
    let chain = Arc::new(MockChain::default());
    chain.set_rewards(address(1), tokens(7));
    chain.fail_rewards(address(0));
    let pool = pool(2);

    let balances = RewardsMonitor::new(chain.clone()).check_all(pool.wallets()).await;

    assert_eq!(balances, vec![(address(1), tokens(7))]);
    assert_eq!(chain.rewards_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rewards_available_is_reported() {
    let chain = Arc::new(MockChain::default());
    let available = RewardsMonitor::new(chain).log_rewards_available().await;
    assert_eq!(available, Some(tokens(1_000_000)));
}
