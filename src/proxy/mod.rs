//! Outbound proxy subsystem.
//!
//! # Data Flow
//! ```text
//! proxies file (one endpoint per line)
//!     → endpoint.rs (parse host:port / user:pass@host:port)
//!     → pool.rs (shared endpoint list + per-client dead set)
//!     → select(excluding) on demand by gateway callers
//! ```
//!
//! # Design Decisions
//! - Endpoint list is immutable and shared; dead marks are local to a fork
//! - Selection is uniform random among live entries
//! - No health score survives a wallet session

pub mod endpoint;
pub mod pool;

pub use endpoint::{parse_proxies, Proxy, ProxyParseError};
pub use pool::ProxyPool;
