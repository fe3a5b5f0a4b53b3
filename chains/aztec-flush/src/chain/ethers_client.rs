use super::{ChainClient, Eip1559Fees, FeeFields, FeeQuote, TxParams, TxReceipt};
use crate::error::{ChainError, ChainErrorKind};
use async_trait::async_trait;
use core_logic::{CoreError, NetworkError};
use ethers::contract::ContractError;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Bytes, Eip1559TransactionRequest, TransactionRequest, H256, U256, U64,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

ethers::contract::abigen!(
    FlushRewarder,
    r#"[
        function flushEntryQueue() external
        function claimRewards() external
        function rewardsOf(address) view returns (uint256)
        function rewardsAvailable() view returns (uint256)
    ]"#
);

ethers::contract::abigen!(
    Rollup,
    r#"[
        function getCurrentSlot() external view returns (uint256)
        function getSlotDuration() external view returns (uint256)
        function getEpochDuration() external view returns (uint256)
    ]"#
);

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// [`ChainClient`] backed by an ethers HTTP provider.
pub struct EthersChain {
    provider: Arc<Provider<Http>>,
    chain_id: u64,
    rewarder: FlushRewarder<Provider<Http>>,
    rollup: Rollup<Provider<Http>>,
    rewarder_address: Address,
}

impl EthersChain {
    /// Connects to `rpc_url` and resolves the chain id used for signing.
    pub async fn connect(
        rpc_url: &Url,
        rpc_timeout: Duration,
        rewarder_address: Address,
        rollup_address: Address,
    ) -> Result<Self, CoreError> {
        let endpoint = rpc_url.to_string();
        let client = Client::builder()
            .timeout(rpc_timeout)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let provider = Provider::new(Http::new_with_client(rpc_url.clone(), client))
            .interval(RECEIPT_POLL_INTERVAL);
        let provider = Arc::new(provider);

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| NetworkError::ConnectionRefused {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            rewarder: FlushRewarder::new(rewarder_address, provider.clone()),
            rollup: Rollup::new(rollup_address, provider.clone()),
            chain_id: chain_id.as_u64(),
            provider,
            rewarder_address,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send(&self, signer: &LocalWallet, tx: TypedTransaction) -> Result<H256, ChainError> {
        let client = SignerMiddleware::new(
            self.provider.clone(),
            signer.clone().with_chain_id(self.chain_id),
        );

        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| ChainError::from_rpc_message(e.to_string()))?;

        Ok(pending.tx_hash())
    }

    fn flush_calldata(&self) -> Result<Bytes, ChainError> {
        self.rewarder
            .flush_entry_queue()
            .calldata()
            .ok_or_else(|| ChainError::invalid_response("flushEntryQueue calldata unavailable"))
    }
}

fn rpc_error(e: impl std::fmt::Display) -> ChainError {
    ChainError::from_rpc_message(e.to_string())
}

/// Contract reverts carry their reason in ABI-encoded data rather than in the
/// message, so decode it before falling back to text classification.
fn contract_error<M: Middleware>(e: ContractError<M>) -> ChainError {
    if let Some(reason) = e.decode_revert::<String>() {
        let message = format!("execution reverted: {}", reason);
        return match ChainError::from_rpc_message(message.clone()) {
            err if err.kind == ChainErrorKind::AlreadyFlushed => err,
            _ => ChainError::new(ChainErrorKind::Reverted, message),
        };
    }
    if e.is_revert() {
        return ChainError::new(ChainErrorKind::Reverted, e.to_string());
    }
    rpc_error(e)
}

fn to_u64(field: &str, value: U256) -> Result<u64, ChainError> {
    if value > U256::from(u64::MAX) {
        return Err(ChainError::invalid_response(format!(
            "{} does not fit in u64: {}",
            field, value
        )));
    }
    Ok(value.as_u64())
}

#[async_trait]
impl ChainClient for EthersChain {
    async fn fee_quote(&self) -> Result<FeeQuote, ChainError> {
        let gas_price = self.provider.get_gas_price().await.map_err(rpc_error)?;

        let eip1559 = match self.provider.estimate_eip1559_fees(None).await {
            Ok((max_fee_per_gas, max_priority_fee_per_gas)) => Some(Eip1559Fees {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            }),
            Err(e) => {
                debug!("EIP-1559 fee data unavailable, using legacy pricing: {}", e);
                None
            }
        };

        Ok(FeeQuote { gas_price, eip1559 })
    }

    async fn native_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(rpc_error)
    }

    async fn slot_duration(&self) -> Result<u64, ChainError> {
        let value = self
            .rollup
            .get_slot_duration()
            .call()
            .await
            .map_err(contract_error)?;
        to_u64("slot duration", value)
    }

    async fn epoch_duration(&self) -> Result<u64, ChainError> {
        let value = self
            .rollup
            .get_epoch_duration()
            .call()
            .await
            .map_err(contract_error)?;
        to_u64("epoch duration", value)
    }

    async fn current_slot(&self) -> Result<u64, ChainError> {
        let value = self
            .rollup
            .get_current_slot()
            .call()
            .await
            .map_err(contract_error)?;
        to_u64("current slot", value)
    }

    async fn rewards_of(&self, address: Address) -> Result<U256, ChainError> {
        self.rewarder
            .rewards_of(address)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn rewards_available(&self) -> Result<U256, ChainError> {
        self.rewarder
            .rewards_available()
            .call()
            .await
            .map_err(contract_error)
    }

    async fn estimate_flush_gas(&self, signer: &LocalWallet) -> Result<U256, ChainError> {
        self.rewarder
            .flush_entry_queue()
            .from(signer.address())
            .estimate_gas()
            .await
            .map_err(contract_error)
    }

    async fn send_flush(&self, signer: &LocalWallet, params: TxParams) -> Result<H256, ChainError> {
        let calldata = self.flush_calldata()?;
        let from = signer.address();

        let tx: TypedTransaction = match params.fees {
            FeeFields::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => Eip1559TransactionRequest::new()
                .from(from)
                .to(self.rewarder_address)
                .data(calldata)
                .gas(params.gas_limit)
                .max_fee_per_gas(max_fee_per_gas)
                .max_priority_fee_per_gas(max_priority_fee_per_gas)
                .into(),
            FeeFields::Legacy { gas_price } => TransactionRequest::new()
                .from(from)
                .to(self.rewarder_address)
                .data(calldata)
                .gas(params.gas_limit)
                .gas_price(gas_price)
                .into(),
        };

        self.send(signer, tx).await
    }

    async fn send_claim(&self, signer: &LocalWallet) -> Result<H256, ChainError> {
        let tx = self.rewarder.claim_rewards().from(signer.address()).tx;
        self.send(signer, tx).await
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, ChainError> {
        let receipt = PendingTransaction::new(tx_hash, self.provider.as_ref())
            .await
            .map_err(rpc_error)?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash: r.transaction_hash,
            success: r.status == Some(U64::from(1)),
            gas_used: r.gas_used.unwrap_or_default(),
            effective_gas_price: r.effective_gas_price,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_u64_bounds() {
        assert_eq!(to_u64("epoch", U256::from(2304u64)).unwrap(), 2304);
        let err = to_u64("epoch", U256::MAX).unwrap_err();
        assert_eq!(err.kind, ChainErrorKind::InvalidResponse);
    }

    #[test]
    fn test_flush_calldata_selector() {
        let provider = Arc::new(Provider::<Http>::try_from("http://localhost:8545").unwrap());
        let rewarder = FlushRewarder::new(Address::zero(), provider);
        let calldata = rewarder.flush_entry_queue().calldata().unwrap();
        // flushEntryQueue() takes no arguments: selector only.
        assert_eq!(calldata.len(), 4);
    }
}
