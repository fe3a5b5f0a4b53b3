//! # Core Logic - Shared Utilities for the Flush Agent
//!
//! This crate provides the ambient pieces the chain crates build on:
//! typed errors, logging, metrics, shutdown handling and key loading.
//!
//! ## Modules
//!
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Attempt and campaign counters
//! - `utils` - Logger, shutdown signal, wallet key loading

pub mod error;
pub mod metrics;
pub(crate) mod utils;

pub use error::{ConfigError, CoreError, NetworkError, WalletError};
pub use metrics::{AttemptClass, MetricsCollector, MetricsSnapshot};

pub use utils::{setup_logger, shutdown_token, sleep_or_cancel, SecretKey, WalletManager};
