use anyhow::{Context, Result};
use aztec_flush::{EthersChain, FlushConfig, FlushOrchestrator, SystemClock, WalletPool};
use core_logic::{setup_logger, shutdown_token};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = setup_logger()?;
    dotenv().ok();

    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let shutdown = shutdown_token();

    let config = FlushConfig::load().context("Failed to load configuration")?;
    info!("Configuration loaded: {:?}", config);

    let connect = EthersChain::connect(
        &config.rpc_url,
        config.rpc_timeout,
        config.flush_rewarder,
        config.rollup,
    );
    let chain = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            warn!("Interrupted before the RPC connection was ready");
            return Ok(());
        }
        chain = connect => chain.context("Failed to connect to RPC")?,
    };
    info!("Connected to chain ID {}", chain.chain_id());

    let pool = WalletPool::from_manager(&config.wallets).context("Failed to load wallets")?;

    let mut orchestrator = FlushOrchestrator::new(
        Arc::new(chain),
        Arc::new(pool),
        Arc::new(SystemClock),
        &config,
    );
    if !orchestrator.start(&shutdown).await? {
        return Ok(());
    }

    orchestrator.run(&shutdown).await;
    Ok(())
}
