//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: address, proxy, tx_hash)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → logging.rs (stdout + optional log file)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Private keys are never part of any event
//! - Proxy credentials are masked by `Proxy`'s Display
//! - Metrics are cheap counter increments; the exporter is opt-in

pub mod logging;
pub mod metrics;
