//! Aptos name minter library.
//!
//! Registers primary domain names for a batch of wallets, routing every
//! node and name-service call through rotating HTTP proxies.

pub mod blockchain;
pub mod config;
pub mod minter;
pub mod names;
pub mod observability;
pub mod proxy;

pub use config::schema::MinterConfig;
pub use minter::{RunSummary, Runner};
