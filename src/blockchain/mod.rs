//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! private key
//!     → wallet.rs (address derivation, signing)
//!     → gateway.rs (HTTP through an optional proxy, typed failures)
//!     → account.rs (proxy probe, resources, balances, coin registration)
//!     → transaction.rs (build, sign, submit, confirm)
//!         → payload.rs (serde derives, encoded with `bcs`)
//! ```
//!
//! # Security Constraints
//! - Private keys never leave `SigningIdentity` and are never logged
//! - Proxy credentials are masked in logs
//! - All HTTP calls carry the configured timeout

pub mod account;
pub mod gateway;
pub mod payload;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use account::AccountClient;
pub use gateway::ChainGateway;
pub use transaction::TransactionSubmitter;
pub use types::{
    AccountResource, Address, BlockchainError, BlockchainResult, Coin, CoinAmount, ConfirmationStatus,
    TransactionReceipt, TransportError, TxHash,
};
pub use wallet::SigningIdentity;
