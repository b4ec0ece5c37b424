//! Aptos name minter (v1)
//!
//! Registers a random primary domain name for every wallet in the key file
//! that does not own one yet.
//!
//! # Architecture Overview
//!
//! ```text
//!   settings.toml ──▶ config ──▶ observability (logging, metrics)
//!                        │
//!   private_keys.txt ──▶ minter::Runner ◀── proxies.txt
//!                        │
//!            ┌───────────┼──────────────────┐
//!            ▼           ▼                  ▼
//!     AccountClient   NameResolver     DomainMinter
//!     (proxy probe,   (primary-name    (register_domain,
//!      resources)      lookup)          confirmation)
//!            │           │                  │
//!            └───────────┴──── ChainGateway ┘
//!                              (reqwest, per-proxy clients)
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use aptos_name_minter::config::load_config;
use aptos_name_minter::minter::{files, MintError, Runner};
use aptos_name_minter::observability::{logging, metrics};
use aptos_name_minter::proxy::parse_proxies;

#[derive(Parser)]
#[command(name = "aptos-name-minter")]
#[command(about = "Mint Aptos primary names for a batch of wallets", long_about = None)]
struct Cli {
    /// Path to the TOML settings file
    #[arg(short, long, default_value = "files/settings.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init_logging(&config.observability)?;

    tracing::info!("aptos-name-minter v0.1.0 starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let keys = files::read_lines(&config.files.private_keys).map_err(|source| MintError::Io {
        path: config.files.private_keys.clone(),
        source,
    })?;
    let proxy_lines = files::read_lines(&config.files.proxies).map_err(|source| MintError::Io {
        path: config.files.proxies.clone(),
        source,
    })?;
    let proxies = parse_proxies(&proxy_lines);

    if proxies.is_empty() {
        let err = MintError::NoProxies(config.files.proxies.clone());
        tracing::error!(error = %err, "Cannot start without proxies");
        return Err(err.into());
    }

    tracing::info!(
        wallets = keys.len(),
        proxies = proxies.len(),
        check_proxy = config.settings.check_proxy,
        "Configuration loaded"
    );

    let runner = Runner::new(&config, proxies)?;
    let summary = runner.run(keys).await;

    tracing::info!(
        minted = summary.minted,
        already_named = summary.already_named,
        abandoned = summary.abandoned,
        "Shutdown complete"
    );
    Ok(())
}
