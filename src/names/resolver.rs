//! Primary-name lookup against the name service HTTP API.

use serde::Deserialize;

use crate::blockchain::gateway::ChainGateway;
use crate::blockchain::types::{Address, BlockchainResult, TransportError};
use crate::observability::metrics;
use crate::proxy::{Proxy, ProxyPool};

/// Proxy failovers allowed per lookup.
const MAX_FAILOVERS: usize = 1;

/// A name bound to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub address: Address,
    pub name: String,
}

/// Result of a primary-name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup {
    /// The address has a primary name.
    Registered(DomainRecord),
    /// The service answered: no name is bound.
    Absent,
    /// No answer could be obtained through the available proxies.
    Undeterminable,
}

#[derive(Debug, Deserialize)]
struct PrimaryNameResponse {
    #[serde(default)]
    name: Option<String>,
}

/// Client for the name service lookup API.
#[derive(Debug, Clone)]
pub struct NameResolver {
    gateway: ChainGateway,
    api_url: String,
}

impl NameResolver {
    pub fn new(gateway: ChainGateway, api_url: impl Into<String>) -> Self {
        Self {
            gateway,
            api_url: api_url.into(),
        }
    }

    /// Look up the primary name bound to `address`.
    ///
    /// A proxy failure is retried once through a fresh proxy from `pool`; a
    /// second proxy failure yields `Undeterminable` rather than an error.
    /// When the service answers, `proxy` is left holding the proxy that
    /// answered.
    pub async fn lookup_primary_name(
        &self,
        address: &Address,
        proxy: &mut Option<Proxy>,
        pool: &mut ProxyPool,
    ) -> BlockchainResult<NameLookup> {
        let url = format!("{}/primary-name/{}", self.api_url.trim_end_matches('/'), address);
        let mut current = proxy.clone();

        for failovers in 0..=MAX_FAILOVERS {
            let lookup = match self.gateway.get(&url, current.as_ref()).await {
                Ok(response) => {
                    let parsed: PrimaryNameResponse = response.json()?;
                    match parsed.name.filter(|n| !n.is_empty()) {
                        Some(name) => NameLookup::Registered(DomainRecord {
                            address: *address,
                            name,
                        }),
                        None => NameLookup::Absent,
                    }
                }
                Err(TransportError::NotFound { .. }) => NameLookup::Absent,
                Err(TransportError::ProxyUnreachable { proxy: failed, reason }) => {
                    tracing::warn!(address = %address, proxy = %failed, reason = %reason, "Name lookup proxy failed");
                    if failovers == MAX_FAILOVERS {
                        break;
                    }
                    if let Some(dead) = &current {
                        pool.mark_dead(dead);
                    }
                    current = pool.select(current.as_ref());
                    if current.is_none() {
                        break;
                    }
                    metrics::record_proxy_failover("name_lookup");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if *proxy != current {
                tracing::info!(address = %address, proxy = ?current, "Switched to failover proxy");
                *proxy = current;
            }
            return Ok(lookup);
        }

        tracing::warn!(address = %address, "Primary name undeterminable");
        Ok(NameLookup::Undeterminable)
    }
}
