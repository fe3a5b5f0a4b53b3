//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// This enum wraps all specific error types and provides a unified
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Network(NetworkError),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid RPC URL format: '{url}'")]
    InvalidRpcUrl { url: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read configuration: {msg}")]
    Source { msg: String },
}

/// Wallet and key handling errors.
///
/// Variants never carry key material, only positions and addresses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("No private keys provided")]
    NoKeys,

    #[error("Invalid private key format at position {position}: expected hex string")]
    InvalidKeyFormat { position: usize },

    #[error("Private key at position {position} has wrong length: expected 64 hex chars, got {length}")]
    InvalidKeyLength { position: usize, length: usize },

    #[error("Wallet {address} is not part of the pool")]
    UnknownAddress { address: String },
}

/// Network and RPC-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Connection refused to {endpoint}: {reason}")]
    ConnectionRefused { endpoint: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_error_never_echoes_key() {
        let err = WalletError::InvalidKeyLength {
            position: 2,
            length: 10,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("position 2"));
        assert!(rendered.contains("got 10"));
    }

    #[test]
    fn test_core_error_is_transparent_for_config() {
        let err: CoreError = ConfigError::MissingField {
            field: "RPC_URL".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Missing required configuration field: 'RPC_URL'"
        );
    }
}
