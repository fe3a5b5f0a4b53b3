use crate::error::WalletError;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A raw EVM private key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    hex: String,
}

impl SecretKey {
    /// Hex-encoded key including the `0x` prefix.
    pub fn expose(&self) -> &str {
        &self.hex
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("hex", &"***REDACTED***")
            .finish()
    }
}

/// Holds the signing keys supplied to the process, in configured order.
#[derive(Debug)]
pub struct WalletManager {
    keys: Vec<SecretKey>,
}

impl WalletManager {
    /// Parses a comma-separated key list (the `PRIVATE_KEYS` format).
    ///
    /// Blank entries are skipped; a list that is empty after trimming is an error.
    pub fn from_key_list(raw: &str) -> Result<Self, WalletError> {
        let mut keys = Vec::new();

        for (position, entry) in raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .enumerate()
        {
            keys.push(Self::parse_key(position, entry)?);
        }

        if keys.is_empty() {
            return Err(WalletError::NoKeys);
        }

        Ok(Self { keys })
    }

    fn parse_key(position: usize, entry: &str) -> Result<SecretKey, WalletError> {
        let body = entry
            .strip_prefix("0x")
            .or_else(|| entry.strip_prefix("0X"))
            .unwrap_or(entry);

        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidKeyFormat { position });
        }
        if body.len() != 64 {
            return Err(WalletError::InvalidKeyLength {
                position,
                length: body.len(),
            });
        }

        Ok(SecretKey {
            hex: format!("0x{}", body.to_ascii_lowercase()),
        })
    }

    /// Returns the number of available wallets
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[SecretKey] {
        &self.keys
    }
}
