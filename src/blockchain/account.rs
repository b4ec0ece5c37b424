//! Per-wallet chain client: identity plus resource access.
//!
//! # Responsibilities
//! - Validate the assigned proxy with a read probe, rotating through the pool
//! - Read account resources (coin stores, coin metadata)
//! - Register a coin on first use
//! - Supply sequence number, gas price and chain id to the submitter

use serde::Deserialize;
use serde_json::Value;

use crate::blockchain::gateway::ChainGateway;
use crate::blockchain::transaction::{is_already_registered, register_coin_payload, TransactionSubmitter};
use crate::blockchain::types::{
    AccountResource, Address, BlockchainError, BlockchainResult, Coin, CoinAmount, NodeConfig,
    TransportError,
};
use crate::blockchain::wallet::SigningIdentity;
use crate::names::{NameLookup, NameResolver};
use crate::observability::metrics;
use crate::proxy::{Proxy, ProxyPool};

#[derive(Debug, Deserialize)]
struct AccountInfo {
    sequence_number: String,
}

#[derive(Debug, Deserialize)]
struct GasEstimate {
    gas_estimate: u64,
}

#[derive(Debug, Deserialize)]
struct LedgerInfo {
    chain_id: u8,
}

/// Chain client bound to one signing identity.
pub struct AccountClient {
    identity: SigningIdentity,
    gateway: ChainGateway,
    /// Worker-local view of the proxy pool; dead marks never leave this client.
    pool: ProxyPool,
    proxy: Option<Proxy>,
    config: NodeConfig,
}

impl AccountClient {
    /// Create a client without probing the proxy.
    pub fn new(
        identity: SigningIdentity,
        proxy: Option<Proxy>,
        pool: &ProxyPool,
        gateway: ChainGateway,
        config: &NodeConfig,
    ) -> Self {
        Self {
            identity,
            gateway,
            pool: pool.fork(),
            proxy,
            config: config.clone(),
        }
    }

    /// Create a client and, if `check_proxy` is set, make sure it can reach the node.
    ///
    /// The probe reads the native coin's decimals; a zero result means the
    /// call did not complete, so the proxy is marked dead and replaced. Fails
    /// with `NoWorkingProxy` once the pool has nothing left to offer.
    pub async fn connect(
        identity: SigningIdentity,
        candidate: Option<Proxy>,
        pool: &ProxyPool,
        gateway: ChainGateway,
        config: &NodeConfig,
        check_proxy: bool,
    ) -> BlockchainResult<Self> {
        let mut client = Self::new(identity, candidate, pool, gateway, config);
        if !check_proxy {
            return Ok(client);
        }

        // Candidate first, then each pool entry at most once.
        let max_attempts = client.pool.len() + 1;
        let native = Coin::aptos();
        let mut attempts = 0;

        loop {
            attempts += 1;
            if client.get_decimals(&native).await > 0 {
                tracing::info!(
                    address = %client.address(),
                    proxy = ?client.proxy,
                    attempts,
                    "Proxy validated"
                );
                return Ok(client);
            }

            tracing::warn!(
                address = %client.address(),
                proxy = ?client.proxy,
                attempt = attempts,
                "Proxy probe failed, rotating"
            );

            let next = match client.proxy.clone() {
                Some(dead) => client.pool.replace(&dead),
                None => client.pool.select(None),
            };
            match next {
                Some(proxy) if attempts < max_attempts => {
                    metrics::record_proxy_failover("probe");
                    client.proxy = Some(proxy);
                }
                _ => return Err(BlockchainError::NoWorkingProxy { attempts }),
            }
        }
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn gateway(&self) -> &ChainGateway {
        &self.gateway
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Node URL for a path relative to the API root.
    pub(crate) fn url(&self, path: &str) -> String {
        let base = self.config.url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }

    /// Read a resource of `resource_type` stored at `address`.
    pub async fn account_resource(
        &self,
        address: &Address,
        resource_type: &str,
        ledger_version: Option<u64>,
    ) -> Result<AccountResource, TransportError> {
        let mut url = self.url(&format!("accounts/{}/resource/{}", address, resource_type));
        if let Some(version) = ledger_version {
            url.push_str(&format!("?ledger_version={}", version));
        }
        self.gateway.get(&url, self.proxy()).await?.json()
    }

    /// This account's coin store for `coin`, registering the coin if absent.
    ///
    /// Registration is attempted at most once per call. An "already
    /// registered" rejection counts as success. A freshly registered coin
    /// yields an empty resource.
    pub async fn get_coin_resource(&self, coin: &Coin) -> BlockchainResult<AccountResource> {
        match self
            .account_resource(&self.address(), &coin.store_resource(), None)
            .await
        {
            Ok(resource) => Ok(resource),
            Err(TransportError::NotFound { .. }) => {
                tracing::info!(address = %self.address(), coin = %coin, "Coin not registered, registering");
                match self.register_coin(coin).await {
                    Ok(()) => {}
                    Err(e) if is_already_registered(&e) => {
                        tracing::debug!(coin = %coin, "Coin already registered");
                    }
                    Err(e) => return Err(e),
                }
                Ok(AccountResource::empty())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Submit and confirm `0x1::managed_coin::register<coin>`.
    pub async fn register_coin(&self, coin: &Coin) -> BlockchainResult<()> {
        let payload = register_coin_payload(coin)?;
        let receipt = TransactionSubmitter::new(self)
            .submit_and_wait(payload)
            .await?;
        tracing::info!(coin = %coin, tx_hash = %receipt.hash, "Coin registered");
        Ok(())
    }

    /// Decimals of `coin`, or 0 when they cannot be determined.
    ///
    /// 0 is never a meaningful value for a registered coin here; callers must
    /// read it as "unknown".
    pub async fn get_decimals(&self, coin: &Coin) -> u8 {
        let Ok(owner) = coin.module_address() else {
            return 0;
        };
        match self.account_resource(&owner, &coin.info_resource(), None).await {
            Ok(info) => info
                .data
                .get("decimals")
                .and_then(value_as_u64)
                .and_then(|d| u8::try_from(d).ok())
                .unwrap_or(0),
            Err(e) => {
                tracing::debug!(coin = %coin, error = %e, "Could not read coin info");
                0
            }
        }
    }

    /// Balance of `coin` (native coin by default). Never fails; unknowns read as zero.
    pub async fn get_balance(&self, coin: Option<&Coin>) -> CoinAmount {
        let native = Coin::aptos();
        let coin = coin.unwrap_or(&native);

        let units = match self.get_coin_resource(coin).await {
            Ok(resource) => resource
                .data
                .pointer("/coin/value")
                .and_then(value_as_u64)
                .unwrap_or(0),
            Err(e) => {
                tracing::warn!(address = %self.address(), coin = %coin, error = %e, "Balance unavailable");
                0
            }
        };
        let decimals = self.get_decimals(coin).await;
        CoinAmount::from_units(units, decimals)
    }

    /// Current sequence number. A missing account means it was never funded.
    pub async fn sequence_number(&self) -> BlockchainResult<u64> {
        let url = self.url(&format!("accounts/{}", self.address()));
        match self.gateway.get(&url, self.proxy()).await {
            Ok(response) => {
                let info: AccountInfo = response.json()?;
                info.sequence_number
                    .parse()
                    .map_err(|_| TransportError::Decode(format!("sequence_number '{}'", info.sequence_number)).into())
            }
            Err(TransportError::NotFound { .. }) => {
                Err(BlockchainError::AccountNotActivated(self.address().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Node gas price estimate, falling back to the configured default.
    pub async fn gas_unit_price(&self) -> u64 {
        let url = self.url("estimate_gas_price");
        match self
            .gateway
            .get(&url, self.proxy())
            .await
            .and_then(|r| r.json::<GasEstimate>())
        {
            Ok(estimate) => estimate.gas_estimate,
            Err(e) => {
                tracing::debug!(error = %e, "Gas estimate unavailable, using default");
                self.config.default_gas_unit_price
            }
        }
    }

    /// Configured chain id, or the node's when unset.
    pub async fn chain_id(&self) -> BlockchainResult<u8> {
        if let Some(id) = self.config.chain_id {
            return Ok(id);
        }
        let info: LedgerInfo = self.gateway.get(&self.url(""), self.proxy()).await?.json()?;
        Ok(info.chain_id)
    }

    /// Raw transaction view by hash.
    pub async fn transaction_by_hash(&self, hash: &str) -> Result<Value, TransportError> {
        let url = self.url(&format!("transactions/by_hash/{}", hash));
        self.gateway.get(&url, self.proxy()).await?.json()
    }

    /// Primary name of this account, failing over through this client's pool.
    ///
    /// A failover proxy that answers replaces this client's proxy for the
    /// calls that follow.
    pub async fn lookup_primary_name(&mut self, resolver: &NameResolver) -> BlockchainResult<NameLookup> {
        let address = self.address();
        resolver
            .lookup_primary_name(&address, &mut self.proxy, &mut self.pool)
            .await
    }
}

impl std::fmt::Debug for AccountClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountClient")
            .field("address", &self.address())
            .field("proxy", &self.proxy)
            .field("node", &self.config.url)
            .finish()
    }
}

/// Numbers arrive either as JSON numbers or as decimal strings.
fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
