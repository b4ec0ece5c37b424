//! Metrics collection and exposition.
//!
//! # Metrics
//! - `minter_transactions_total` (counter): by `status` (confirmed, failed, timed_out, rejected)
//! - `minter_proxy_failovers_total` (counter): by `site` (probe, name_lookup)
//! - `minter_wallets_total` (counter): by `outcome` (minted, already_named, skipped, abandoned)

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transaction(status: &'static str) {
    metrics::counter!("minter_transactions_total", "status" => status).increment(1);
}

pub fn record_proxy_failover(site: &'static str) {
    metrics::counter!("minter_proxy_failovers_total", "site" => site).increment(1);
}

pub fn record_wallet(outcome: &'static str) {
    metrics::counter!("minter_wallets_total", "outcome" => outcome).increment(1);
}
