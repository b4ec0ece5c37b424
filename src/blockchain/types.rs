//! Chain-specific types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sha3::{Digest, Sha3_256};
use thiserror::Error;

// Re-export NodeConfig from config module to avoid duplication
pub use crate::config::schema::NodeConfig;

/// Scheme byte appended to an Ed25519 public key before hashing it into an address.
const ED25519_SCHEME: u8 = 0x00;

/// Errors produced by the HTTP transport layer.
///
/// No retry policy lives behind these; each call site decides what to do.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection or tunnel failure attributable to the proxy.
    #[error("Proxy {proxy} unreachable: {reason}")]
    ProxyUnreachable { proxy: String, reason: String },

    /// Connection failure on a direct (unproxied) request.
    #[error("Network error: {0}")]
    Network(String),

    /// The resource does not exist (HTTP 404).
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// The remote answered with a status >= 400.
    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every proxy available to this client failed the capability probe.
    #[error("No working proxy after {attempts} probe attempts")]
    NoWorkingProxy { attempts: usize },

    /// The sending account has never been funded on-chain.
    #[error("Account {0} is not activated, send gas to activate it")]
    AccountNotActivated(String),

    /// The node rejected the signed transaction.
    #[error("Transaction submission rejected ({status}): {body}")]
    SubmissionError { status: u16, body: String },

    /// The transaction reached a terminal, unsuccessful state.
    #[error("Transaction {hash} failed: {reason}")]
    TransactionFailed { hash: String, reason: String },

    /// Confirmation polling exhausted its attempt budget.
    #[error("Transaction {hash} not confirmed after {attempts} polls")]
    TimedOut { hash: String, attempts: u32 },

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid type tag '{0}'")]
    InvalidTypeTag(String),

    #[error("BCS encoding failed: {0}")]
    Encoding(#[from] bcs::Error),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// 32-byte account address. Serializes as 32 raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Derive the account address owned by an Ed25519 public key.
    pub fn from_ed25519_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(public_key);
        hasher.update([ED25519_SCHEME]);
        Self(hasher.finalize().into())
    }

    /// Framework address `0x1`.
    #[cfg(test)]
    pub(crate) fn one() -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = BlockchainError;

    /// Accepts full and short (`0x1`) hex forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return Err(BlockchainError::InvalidAddress(s.to_string()));
        }
        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| BlockchainError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// A coin identified by its fully qualified Move type.
///
/// Equality only looks at the type tag; the display name is cosmetic.
#[derive(Debug, Clone)]
pub struct Coin {
    type_tag: String,
    name: String,
}

impl Coin {
    pub fn new(type_tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            name: name.into(),
        }
    }

    /// The chain's native gas coin.
    pub fn aptos() -> Self {
        Self::new("0x1::aptos_coin::AptosCoin", "AptosCoin")
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Address of the account that published the coin module.
    pub fn module_address(&self) -> BlockchainResult<Address> {
        let head = self
            .type_tag
            .split("::")
            .next()
            .ok_or_else(|| BlockchainError::InvalidTypeTag(self.type_tag.clone()))?;
        head.parse()
    }

    /// `0x1::coin::CoinStore<T>`, held by every account registered for the coin.
    pub fn store_resource(&self) -> String {
        format!("0x1::coin::CoinStore<{}>", self.type_tag)
    }

    /// `0x1::coin::CoinInfo<T>`, held by the publishing account.
    pub fn info_resource(&self) -> String {
        format!("0x1::coin::CoinInfo<{}>", self.type_tag)
    }
}

impl PartialEq for Coin {
    fn eq(&self, other: &Self) -> bool {
        self.type_tag == other.type_tag
    }
}

impl Eq for Coin {}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An amount in base units together with the coin's decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinAmount {
    units: u64,
    decimals: u8,
}

impl CoinAmount {
    pub fn from_units(units: u64, decimals: u8) -> Self {
        Self { units, decimals }
    }
}

impl fmt::Display for CoinAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(scale) = 10u128.checked_pow(self.decimals as u32) else {
            return write!(f, "{}e-{}", self.units, self.decimals);
        };
        let units = self.units as u128;
        let whole = units / scale;
        let frac = units % scale;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:0>width$}", frac, width = self.decimals as usize);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

/// Transaction hash as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed, address-scoped on-chain state.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct AccountResource {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl AccountResource {
    /// Placeholder for a resource that does not exist yet.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Outcome of polling a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// The transaction executed successfully.
    Confirmed(TransactionReceipt),
    /// The transaction executed and was rejected by the VM.
    Failed { hash: TxHash, reason: String },
    /// The attempt budget ran out while the transaction was still pending.
    TimedOut { hash: TxHash, attempts: u32 },
}

impl ConfirmationStatus {
    /// Turn terminal non-success states into typed errors.
    pub fn into_result(self) -> BlockchainResult<TransactionReceipt> {
        match self {
            ConfirmationStatus::Confirmed(receipt) => Ok(receipt),
            ConfirmationStatus::Failed { hash, reason } => Err(BlockchainError::TransactionFailed {
                hash: hash.0,
                reason,
            }),
            ConfirmationStatus::TimedOut { hash, attempts } => Err(BlockchainError::TimedOut {
                hash: hash.0,
                attempts,
            }),
        }
    }
}

/// A confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub hash: TxHash,
    pub version: Option<u64>,
    pub vm_status: String,
    /// Number of status polls it took to observe the terminal state.
    pub polls: u32,
}
