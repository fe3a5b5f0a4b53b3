use core_logic::{WalletError, WalletManager};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::error;

/// One signing identity plus its attempt counters.
#[derive(Debug)]
pub struct WalletCredential {
    index: usize,
    signer: LocalWallet,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl WalletCredential {
    pub fn new(index: usize, signer: LocalWallet) -> Self {
        Self {
            index,
            signer,
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Zero-based position in the configured key list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based label used in log lines.
    pub fn label(&self) -> String {
        format!("Wallet {}", self.index + 1)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &LocalWallet {
        &self.signer
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletStats {
    pub address: Address,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
}

/// Short `0x12345678...` form used in tables.
pub fn short_address(address: &Address) -> String {
    let full = format!("{:?}", address);
    format!("{}...", &full[..10])
}

/// Fixed set of wallets for the process lifetime.
#[derive(Debug)]
pub struct WalletPool {
    wallets: Vec<WalletCredential>,
    current_index: AtomicUsize,
}

impl WalletPool {
    pub fn new(signers: Vec<LocalWallet>) -> Result<Self, WalletError> {
        if signers.is_empty() {
            return Err(WalletError::NoKeys);
        }

        let wallets = signers
            .into_iter()
            .enumerate()
            .map(|(i, signer)| WalletCredential::new(i, signer))
            .collect();

        Ok(Self {
            wallets,
            current_index: AtomicUsize::new(0),
        })
    }

    /// Builds signers from the loaded key list.
    pub fn from_manager(manager: &WalletManager) -> Result<Self, WalletError> {
        let signers = manager
            .keys()
            .iter()
            .enumerate()
            .map(|(position, key)| {
                key.expose()
                    .parse::<LocalWallet>()
                    .map_err(|_| WalletError::InvalidKeyFormat { position })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(signers)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Round-robin selection starting from the first wallet.
    pub fn next_wallet(&self) -> &WalletCredential {
        let idx = self.current_index.fetch_add(1, Ordering::SeqCst);
        &self.wallets[idx % self.wallets.len()]
    }

    pub fn wallets(&self) -> &[WalletCredential] {
        &self.wallets
    }

    pub fn record_success(&self, address: Address) -> Result<(), WalletError> {
        self.find(address)?.successes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn record_failure(&self, address: Address) -> Result<(), WalletError> {
        self.find(address)?.failures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn find(&self, address: Address) -> Result<&WalletCredential, WalletError> {
        self.wallets
            .iter()
            .find(|w| w.address() == address)
            .ok_or_else(|| {
                error!("Counter update for unknown wallet {:?} ignored", address);
                WalletError::UnknownAddress {
                    address: format!("{:?}", address),
                }
            })
    }

    pub fn stats(&self) -> Vec<WalletStats> {
        self.wallets
            .iter()
            .map(|w| {
                let successes = w.successes();
                let failures = w.failures();
                WalletStats {
                    address: w.address(),
                    successes,
                    failures,
                    success_rate: successes as f64 / (successes + failures).max(1) as f64,
                }
            })
            .collect()
    }

    /// Success ratio across every wallet's attempts so far.
    pub fn overall_success_rate(&self) -> f64 {
        let (successes, total) = self.stats().iter().fold((0u64, 0u64), |(s, t), w| {
            (s + w.successes, t + w.successes + w.failures)
        });
        successes as f64 / total.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 3] = [
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    ];

    fn pool(n: usize) -> WalletPool {
        let manager = WalletManager::from_key_list(&KEYS[..n].join(",")).unwrap();
        WalletPool::from_manager(&manager).unwrap()
    }

    #[test]
    fn test_round_robin_visits_each_wallet_once_per_cycle() {
        let pool = pool(3);
        for _cycle in 0..3 {
            let picked: Vec<usize> = (0..3).map(|_| pool.next_wallet().index()).collect();
            assert_eq!(picked, vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_round_robin_independent_of_counters() {
        let pool = pool(2);
        let first = pool.wallets()[0].address();
        pool.record_failure(first).unwrap();
        pool.record_success(first).unwrap();
        assert_eq!(pool.next_wallet().index(), 0);
        assert_eq!(pool.next_wallet().index(), 1);
        assert_eq!(pool.next_wallet().index(), 0);
    }

    #[test]
    fn test_success_rate_never_divides_by_zero() {
        let pool = pool(2);
        let stats = pool.stats();
        assert!(stats.iter().all(|s| s.success_rate == 0.0));
        assert_eq!(pool.overall_success_rate(), 0.0);
    }

    #[test]
    fn test_success_rate_stays_in_unit_interval() {
        let pool = pool(2);
        let a = pool.wallets()[0].address();
        let b = pool.wallets()[1].address();

        pool.record_success(a).unwrap();
        pool.record_success(a).unwrap();
        pool.record_failure(a).unwrap();
        pool.record_success(b).unwrap();

        let stats = pool.stats();
        assert_eq!((stats[0].successes, stats[0].failures), (2, 1));
        assert!((stats[0].success_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats[1].success_rate, 1.0);
        for s in &stats {
            assert!((0.0..=1.0).contains(&s.success_rate));
        }
        assert!((pool.overall_success_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_address_is_reported_not_fatal() {
        let pool = pool(1);
        let err = pool.record_success(Address::repeat_byte(0x11)).unwrap_err();
        assert!(matches!(err, WalletError::UnknownAddress { .. }));
        assert_eq!(pool.wallets()[0].successes(), 0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let pool = std::sync::Arc::new(pool(1));
        let address = pool.wallets()[0].address();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        pool.record_failure(address).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(pool.wallets()[0].failures(), 8000);
    }

    #[test]
    fn test_short_address() {
        let short = short_address(&Address::repeat_byte(0xab));
        assert_eq!(short, "0xabababab...");
    }
}
