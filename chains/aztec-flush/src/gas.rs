use crate::chain::{FeeFields, FeeQuote, TxParams};
use ethers::types::U256;

/// Gas limit safety margin, as a percentage of the node's estimate.
pub const GAS_LIMIT_MARGIN_PERCENT: u64 = 120;

/// Campaign-level fee ceiling.
#[derive(Debug, Clone, Copy)]
pub struct GasGate {
    ceiling: U256,
}

impl GasGate {
    pub fn new(ceiling: U256) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> U256 {
        self.ceiling
    }

    /// True when `fee_per_gas` is at or below the ceiling.
    pub fn should_proceed(&self, fee_per_gas: U256) -> bool {
        should_proceed(fee_per_gas, self.ceiling)
    }
}

pub fn should_proceed(fee_per_gas: U256, ceiling: U256) -> bool {
    fee_per_gas <= ceiling
}

/// Applies the safety margin to a gas estimate.
pub fn padded_gas_limit(estimate: U256) -> U256 {
    estimate.saturating_mul(U256::from(GAS_LIMIT_MARGIN_PERCENT)) / U256::from(100u64)
}

/// Builds transaction gas parameters from an estimate and the current quote.
///
/// EIP-1559 fields are used whenever the node reported them; otherwise the
/// legacy gas price is sent.
pub fn tx_params(estimate: U256, quote: &FeeQuote) -> TxParams {
    let fees = match quote.eip1559 {
        Some(fees) => FeeFields::Eip1559 {
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        },
        None => FeeFields::Legacy {
            gas_price: quote.gas_price,
        },
    };

    TxParams {
        gas_limit: padded_gas_limit(estimate),
        fees,
    }
}

/// Formats a wei amount as gwei for logs.
pub fn format_gwei(wei: U256) -> String {
    ethers::utils::format_units(wei, "gwei").unwrap_or_else(|_| wei.to_string())
}
