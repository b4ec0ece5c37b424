//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the minter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the minter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MinterConfig {
    /// Run settings (proxy checking, pacing).
    pub settings: Settings,

    /// Full node connection and transaction parameters.
    pub node: NodeConfig,

    /// Name service API and registration parameters.
    pub names: NamesConfig,

    /// Input file locations.
    pub files: FilesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Per-run settings consumed by the wallet loop.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Probe each wallet's proxy before use and rotate dead ones out.
    pub check_proxy: bool,

    /// Pause between wallets, in seconds.
    pub sleep_time: FromTo,

    /// Failed mint attempts tolerated per wallet before it is dropped.
    pub max_wallet_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_proxy: true,
            sleep_time: FromTo { from: 30, to: 60 },
            max_wallet_attempts: 3,
        }
    }
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FromTo {
    pub from: u64,
    pub to: u64,
}

/// Full node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// REST API base URL, including the `/v1` prefix.
    pub url: String,

    /// Chain ID; queried from the node when unset.
    pub chain_id: Option<u8>,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Gas budget for every transaction.
    pub max_gas_amount: u64,

    /// Gas price used when the node's estimate is unavailable.
    pub default_gas_unit_price: u64,

    /// Seconds from now until a submitted transaction expires.
    pub expiration_secs: u64,

    /// Delay between confirmation polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum number of confirmation polls.
    pub max_poll_attempts: u32,

    /// Transaction explorer base URL.
    pub explorer_url: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "https://fullnode.mainnet.aptoslabs.com/v1".to_string(),
            chain_id: Some(1),
            request_timeout_secs: 20,
            max_gas_amount: 100_000,
            default_gas_unit_price: 100,
            expiration_secs: 600,
            poll_interval_ms: 1_000,
            max_poll_attempts: 20,
            explorer_url: "https://explorer.aptoslabs.com/txn".to_string(),
        }
    }
}

/// Name service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamesConfig {
    /// Lookup API base URL.
    pub api_url: String,

    /// Module exposing the registration entry function.
    pub router_module: String,

    /// Registration entry function name.
    pub register_function: String,

    /// Registration period in seconds.
    pub registration_duration_secs: u64,

    /// Length bounds for generated names.
    pub name_length: FromTo,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            api_url: "https://www.aptosnames.com/api/mainnet/v1".to_string(),
            router_module: "0x867ed1f6bf916171b1de3ee92849b8978b7d1b9e0a8cc982a3d19d535dfd9c0c::router"
                .to_string(),
            register_function: "register_domain".to_string(),
            registration_duration_secs: 365 * 24 * 60 * 60,
            name_length: FromTo { from: 8, to: 12 },
        }
    }
}

/// Input file locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilesConfig {
    /// One hex private key per line.
    pub private_keys: String,

    /// One proxy per line.
    pub proxies: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            private_keys: "files/private_keys.txt".to_string(),
            proxies: "files/proxies.txt".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Optional plain-text log file receiving debug-level events.
    pub log_file: Option<String>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: Some("files/debug.log".to_string()),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
