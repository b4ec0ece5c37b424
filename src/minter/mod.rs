//! Domain minting workflow.
//!
//! # Data Flow
//! ```text
//! private_keys.txt + proxies.txt
//!     → files.rs (read non-empty lines)
//!     → runner.rs (pair keys with proxies, pick wallets at random)
//!         → AccountClient::connect (proxy probe)
//!         → NameResolver (skip wallets that already own a name)
//!         → domain.rs (generate a name, register it, confirm)
//!     → pacing sleep, next wallet
//! ```

pub mod domain;
pub mod files;
pub mod runner;

pub use domain::{explorer_tx_url, generate_name, DomainMinter, MintedDomain};
pub use runner::{MintError, RunSummary, Runner};
