//! Proxy pool with per-client dead-proxy exclusion.
//!
//! # Responsibilities
//! - Hand out proxies uniformly at random
//! - Skip proxies this client has already seen fail
//! - Signal exhaustion with `None`

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::proxy::endpoint::Proxy;

/// Shared endpoint list plus a dead set owned by whoever holds this value.
///
/// `fork()` hands a worker its own exclusion state over the same endpoints,
/// so no lock is needed when wallets run on separate tasks.
#[derive(Debug, Clone)]
pub struct ProxyPool {
    proxies: Arc<[Proxy]>,
    dead: HashSet<Proxy>,
}

impl ProxyPool {
    pub fn new(proxies: Vec<Proxy>) -> Self {
        Self {
            proxies: proxies.into(),
            dead: HashSet::new(),
        }
    }

    /// Same endpoints, fresh exclusion state.
    pub fn fork(&self) -> Self {
        Self {
            proxies: self.proxies.clone(),
            dead: HashSet::new(),
        }
    }

    /// Pick a live proxy at random, avoiding `excluding` if given.
    pub fn select(&self, excluding: Option<&Proxy>) -> Option<Proxy> {
        let candidates: Vec<&Proxy> = self
            .proxies
            .iter()
            .filter(|p| !self.is_dead(p) && Some(*p) != excluding)
            .collect();

        let choice = candidates.choose(&mut rand::thread_rng()).map(|p| (*p).clone());
        if choice.is_none() {
            tracing::debug!(
                total = self.proxies.len(),
                dead = self.dead.len(),
                "Proxy pool exhausted"
            );
        }
        choice
    }

    /// Exclude a proxy from future selection by this pool instance.
    pub fn mark_dead(&mut self, proxy: &Proxy) {
        if self.dead.insert(proxy.clone()) {
            tracing::debug!(proxy = %proxy, remaining = self.available(), "Proxy marked dead");
        }
    }

    /// Mark `dead` and draw a replacement.
    pub fn replace(&mut self, dead: &Proxy) -> Option<Proxy> {
        self.mark_dead(dead);
        self.select(Some(dead))
    }

    /// Total number of endpoints, dead or alive.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Number of endpoints not yet marked dead.
    pub fn available(&self) -> usize {
        self.proxies.iter().filter(|p| !self.is_dead(p)).count()
    }

    pub fn is_dead(&self, proxy: &Proxy) -> bool {
        self.dead.contains(proxy)
    }
}

impl Default for ProxyPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
