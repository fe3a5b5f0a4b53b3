use config::{Config, Environment, Map};
use core_logic::{ConfigError, CoreError, WalletManager};
use ethers::types::{Address, U256};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const FLUSH_REWARDER_ADDRESS: &str = "0x7C9a7130379F1B5dd6e7A53AF84fC0fE32267B65";
pub const ROLLUP_ADDRESS: &str = "0x603bb2c05D474794ea97805e8De69bCcFb3bCA12";

/// Environment variables as read, before validation.
#[derive(Deserialize, Clone)]
struct RawConfig {
    rpc_url: Option<String>,
    private_keys: Option<String>,
    #[serde(default = "default_max_gas_price_gwei")]
    max_gas_price_gwei: f64,
    #[serde(default = "default_epoch_duration_seconds")]
    epoch_duration_seconds: u64,
    #[serde(default = "default_flush_offset_seconds")]
    flush_offset_seconds: u64,
    #[serde(default = "default_flush_rewarder_address")]
    flush_rewarder_address: String,
    #[serde(default = "default_rollup_address")]
    rollup_address: String,
    #[serde(default = "default_claim_threshold_tokens")]
    claim_threshold_tokens: f64,
    #[serde(default = "default_max_jitter_ms")]
    max_jitter_ms: u64,
    #[serde(default = "default_attempt_timeout_seconds")]
    attempt_timeout_seconds: u64,
    #[serde(default = "default_loop_backoff_seconds")]
    loop_backoff_seconds: u64,
    #[serde(default = "default_rpc_timeout_seconds")]
    rpc_timeout_seconds: u64,
    metrics_path: Option<String>,
}

fn default_max_gas_price_gwei() -> f64 {
    50.0
}
fn default_epoch_duration_seconds() -> u64 {
    2304 // 38.4 minutes
}
fn default_flush_offset_seconds() -> u64 {
    2
}
fn default_flush_rewarder_address() -> String {
    FLUSH_REWARDER_ADDRESS.to_string()
}
fn default_rollup_address() -> String {
    ROLLUP_ADDRESS.to_string()
}
fn default_claim_threshold_tokens() -> f64 {
    1000.0
}
fn default_max_jitter_ms() -> u64 {
    500
}
fn default_attempt_timeout_seconds() -> u64 {
    300
}
fn default_loop_backoff_seconds() -> u64 {
    30
}
fn default_rpc_timeout_seconds() -> u64 {
    30
}

/// Validated agent configuration.
pub struct FlushConfig {
    pub rpc_url: Url,
    pub wallets: WalletManager,
    /// Fee-per-gas ceiling in wei.
    pub max_gas_price: U256,
    pub max_gas_price_gwei: f64,
    /// Used until the rollup reports its own epoch duration.
    pub epoch_duration_seconds: u64,
    pub flush_offset_seconds: u64,
    pub flush_rewarder: Address,
    pub rollup: Address,
    /// Accrued reward (wei) above which a claim follows a successful flush.
    pub claim_threshold: U256,
    pub max_jitter: Duration,
    pub attempt_timeout: Duration,
    pub loop_backoff: Duration,
    pub rpc_timeout: Duration,
    pub metrics_path: Option<String>,
}

impl fmt::Debug for FlushConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushConfig")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("wallets", &self.wallets.count())
            .field("max_gas_price_gwei", &self.max_gas_price_gwei)
            .field("epoch_duration_seconds", &self.epoch_duration_seconds)
            .field("flush_offset_seconds", &self.flush_offset_seconds)
            .field("flush_rewarder", &self.flush_rewarder)
            .field("rollup", &self.rollup)
            .field("claim_threshold", &self.claim_threshold)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl FlushConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, CoreError> {
        Self::from_environment(Environment::default())
    }

    /// Loads configuration from an explicit variable map instead of the process
    /// environment.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, CoreError> {
        Self::from_environment(Environment::default().source(Some(vars)))
    }

    fn from_environment(env: Environment) -> Result<Self, CoreError> {
        let settings = Config::builder()
            .add_source(env)
            .build()
            .map_err(source_error)?;

        let raw: RawConfig = settings.try_deserialize().map_err(source_error)?;
        raw.validate()
    }
}

fn source_error(e: config::ConfigError) -> ConfigError {
    ConfigError::Source { msg: e.to_string() }
}

impl RawConfig {
    fn validate(self) -> Result<FlushConfig, CoreError> {
        let rpc_raw = self
            .rpc_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| missing("RPC_URL"))?;
        let rpc_url = Url::parse(rpc_raw.trim()).map_err(|_| ConfigError::InvalidRpcUrl {
            url: rpc_raw.clone(),
        })?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidRpcUrl { url: rpc_raw }.into());
        }

        let keys = self.private_keys.ok_or_else(|| missing("PRIVATE_KEYS"))?;
        let wallets = WalletManager::from_key_list(&keys)?;

        if !self.max_gas_price_gwei.is_finite() || self.max_gas_price_gwei <= 0.0 {
            return Err(invalid("MAX_GAS_PRICE_GWEI", "must be a positive number").into());
        }
        let max_gas_price: U256 =
            ethers::utils::parse_units(self.max_gas_price_gwei.to_string(), "gwei")
                .map_err(|e| invalid("MAX_GAS_PRICE_GWEI", &e.to_string()))?
                .into();

        if self.epoch_duration_seconds == 0 {
            return Err(invalid("EPOCH_DURATION_SECONDS", "must be greater than zero").into());
        }

        if !self.claim_threshold_tokens.is_finite() || self.claim_threshold_tokens < 0.0 {
            return Err(invalid("CLAIM_THRESHOLD_TOKENS", "must be zero or positive").into());
        }
        let claim_threshold = ethers::utils::parse_ether(self.claim_threshold_tokens)
            .map_err(|e| invalid("CLAIM_THRESHOLD_TOKENS", &e.to_string()))?;

        if self.attempt_timeout_seconds == 0 {
            return Err(invalid("ATTEMPT_TIMEOUT_SECONDS", "must be greater than zero").into());
        }

        Ok(FlushConfig {
            rpc_url,
            wallets,
            max_gas_price,
            max_gas_price_gwei: self.max_gas_price_gwei,
            epoch_duration_seconds: self.epoch_duration_seconds,
            flush_offset_seconds: self.flush_offset_seconds,
            flush_rewarder: parse_address("FLUSH_REWARDER_ADDRESS", &self.flush_rewarder_address)?,
            rollup: parse_address("ROLLUP_ADDRESS", &self.rollup_address)?,
            claim_threshold,
            max_jitter: Duration::from_millis(self.max_jitter_ms),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_seconds),
            loop_backoff: Duration::from_secs(self.loop_backoff_seconds),
            rpc_timeout: Duration::from_secs(self.rpc_timeout_seconds),
            metrics_path: self.metrics_path.filter(|p| !p.trim().is_empty()),
        })
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingField {
        field: field.to_string(),
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| invalid(field, &e.to_string()))
}
