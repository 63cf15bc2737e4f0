//! dex-swap
//!
//! Quotes, prepares and sends token swaps through a DEX aggregator, signing
//! with a local key.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser / swap-cli
//!          │
//!          ▼
//!   ┌─────────────┐     ┌──────────────┐      ┌──────────────────┐
//!   │    http     │────▶│   workflow   │─────▶│    aggregator    │──▶ quote / swap API
//!   │ axum router │     │ SwapSession  │      │ (auth::signer)   │
//!   └─────────────┘     └──────┬───────┘      └──────────────────┘
//!                              │
//!                              ▼
//!                       ┌──────────────┐
//!                       │  blockchain  │──▶ JSON-RPC node
//!                       │ TxSubmitter  │
//!                       └──────────────┘
//!
//!   Cross-cutting: config, observability (logs + metrics), lifecycle
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use dex_swap::config::loader::{load_with_credentials, resolve_config_path};
use dex_swap::http::HttpServer;
use dex_swap::lifecycle::{build_services, signals, startup, Shutdown};
use dex_swap::observability::{logging, metrics};

const RPC_PROBE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "dex-swap")]
#[command(about = "Quote, prepare and send DEX aggregator swaps", long_about = None)]
struct Args {
    /// Path to the TOML config file (falls back to DEX_SWAP_CONFIG, then defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config_path = resolve_config_path(args.config);

    let (config, credentials) = match load_with_credentials(config_path.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            // Logging is not configured yet
            eprintln!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        "dex-swap starting"
    );

    tracing::info!(
        bind_address = %config.server.bind_address,
        aggregator = %config.aggregator.base_url,
        rpc_url = %config.chain.rpc_url,
        chain_id = config.chain.chain_id,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = build_services(&config, &credentials).await?;
    drop(credentials);

    let shutdown = Shutdown::new();
    let probe = startup::spawn_rpc_probe(services.chain, RPC_PROBE_INTERVAL, shutdown.subscribe());

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config.server.clone(), services.session);
    let server_done = shutdown.signalled();
    let signal_task = tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_done).await?;
    signal_task.abort();
    let _ = probe.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
