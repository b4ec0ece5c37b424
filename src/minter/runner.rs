//! Wallet iteration loop.
//!
//! Wallets are drawn at random. Each one either already owns a primary
//! name, gets a new one, or fails; failures are retried on a later draw until
//! `max_wallet_attempts` is reached.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::sleep;

use crate::blockchain::{AccountClient, BlockchainError, ChainGateway, SigningIdentity, TransportError};
use crate::config::MinterConfig;
use crate::minter::domain::{DomainMinter, MintedDomain};
use crate::names::{NameLookup, NameResolver};
use crate::observability::metrics;
use crate::proxy::{Proxy, ProxyPool};

/// Errors that stop a run before any wallet is processed.
#[derive(Debug, Error)]
pub enum MintError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No proxies found, add proxies to {0}")]
    NoProxies(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub minted: usize,
    pub already_named: usize,
    pub abandoned: usize,
}

#[derive(Debug)]
enum WalletOutcome {
    Minted(MintedDomain),
    AlreadyNamed(String),
    /// Name ownership could not be checked; try again later.
    Deferred,
}

struct WalletSlot {
    key: String,
    proxy: Option<Proxy>,
    failures: u32,
}

/// Drives the mint workflow across a batch of wallets.
pub struct Runner<'a> {
    config: &'a MinterConfig,
    gateway: ChainGateway,
    resolver: NameResolver,
    proxies: Vec<Proxy>,
    pool: ProxyPool,
}

impl<'a> Runner<'a> {
    pub fn new(config: &'a MinterConfig, proxies: Vec<Proxy>) -> Result<Self, MintError> {
        let gateway = ChainGateway::new(Duration::from_secs(config.node.request_timeout_secs))?;
        let resolver = NameResolver::new(gateway.clone(), config.names.api_url.clone());
        Ok(Self {
            config,
            gateway,
            resolver,
            pool: ProxyPool::new(proxies.clone()),
            proxies,
        })
    }

    /// Process every key until each is named, minted or abandoned.
    pub async fn run(&self, keys: Vec<String>) -> RunSummary {
        let mut wallets = self.assign_proxies(keys);
        let mut summary = RunSummary::default();
        let max_attempts = self.config.settings.max_wallet_attempts;

        while !wallets.is_empty() {
            let i = rand::thread_rng().gen_range(0..wallets.len());
            tracing::info!(wallets_left = wallets.len(), "Processing next wallet");

            match self.process(&wallets[i]).await {
                Ok(WalletOutcome::AlreadyNamed(name)) => {
                    tracing::info!(domain = %name, "Wallet already has a primary name");
                    metrics::record_wallet("already_named");
                    summary.already_named += 1;
                    wallets.swap_remove(i);
                }
                Ok(WalletOutcome::Minted(minted)) => {
                    tracing::info!(domain = %minted.name, tx_hash = %minted.receipt.hash, "Domain minted");
                    metrics::record_wallet("minted");
                    summary.minted += 1;
                    wallets.swap_remove(i);
                    if !wallets.is_empty() {
                        self.pace().await;
                    }
                }
                Ok(WalletOutcome::Deferred) => {
                    metrics::record_wallet("skipped");
                    if self.record_failure(&mut wallets[i], max_attempts) {
                        metrics::record_wallet("abandoned");
                        summary.abandoned += 1;
                        wallets.swap_remove(i);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Can not mint domain name");
                    metrics::record_wallet("skipped");
                    if is_permanent(&e) || self.record_failure(&mut wallets[i], max_attempts) {
                        metrics::record_wallet("abandoned");
                        summary.abandoned += 1;
                        wallets.swap_remove(i);
                    }
                }
            }
        }

        tracing::info!(
            minted = summary.minted,
            already_named = summary.already_named,
            abandoned = summary.abandoned,
            "Run complete"
        );
        summary
    }

    /// Pair keys with proxies, cycling the proxy list when it is shorter.
    fn assign_proxies(&self, keys: Vec<String>) -> Vec<WalletSlot> {
        keys.into_iter()
            .enumerate()
            .map(|(i, key)| WalletSlot {
                key,
                proxy: self.proxies.get(i % self.proxies.len().max(1)).cloned(),
                failures: 0,
            })
            .collect()
    }

    /// Returns true when the wallet has used up its attempts.
    fn record_failure(&self, slot: &mut WalletSlot, max_attempts: u32) -> bool {
        slot.failures += 1;
        let exhausted = slot.failures >= max_attempts;
        if exhausted {
            tracing::warn!(failures = slot.failures, "Giving up on wallet");
        }
        exhausted
    }

    async fn process(&self, slot: &WalletSlot) -> Result<WalletOutcome, BlockchainError> {
        let identity = SigningIdentity::from_private_key(&slot.key)?;
        let mut account = AccountClient::connect(
            identity,
            slot.proxy.clone(),
            &self.pool,
            self.gateway.clone(),
            &self.config.node,
            self.config.settings.check_proxy,
        )
        .await?;
        tracing::info!(address = %account.address(), "Current wallet");

        match account.lookup_primary_name(&self.resolver).await? {
            NameLookup::Registered(record) => return Ok(WalletOutcome::AlreadyNamed(record.name)),
            NameLookup::Absent => {}
            NameLookup::Undeterminable => {
                tracing::warn!(address = %account.address(), "Could not check existing name, deferring wallet");
                return Ok(WalletOutcome::Deferred);
            }
        }

        let minted = DomainMinter::new(&account, &self.config.names).mint(None).await?;
        Ok(WalletOutcome::Minted(minted))
    }

    async fn pace(&self) {
        let range = self.config.settings.sleep_time;
        let secs = rand::thread_rng().gen_range(range.from..=range.to.max(range.from));
        tracing::info!(seconds = secs, "Sleeping before next wallet");
        sleep(Duration::from_secs(secs)).await;
    }
}

/// Errors that retrying the same wallet cannot fix.
fn is_permanent(error: &BlockchainError) -> bool {
    matches!(
        error,
        BlockchainError::Wallet(_) | BlockchainError::AccountNotActivated(_)
    )
}
