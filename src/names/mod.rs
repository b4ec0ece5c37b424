//! Name service subsystem.
//!
//! # Data Flow
//! ```text
//! address
//!     → resolver.rs (GET /primary-name/{address} through the account's proxy)
//!     → on proxy failure: one failover draw from the pool
//!     → NameLookup (Registered | Absent | Undeterminable)
//! ```

pub mod resolver;

pub use resolver::{DomainRecord, NameLookup, NameResolver};
