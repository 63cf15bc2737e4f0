//! Startup orchestration.
//!
//! # Responsibilities
//! - Check the signing key against the configured wallet
//! - Build the aggregator client, RPC client and submitter in order
//! - Start the RPC health probe
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::aggregator::{AggregatorClient, AggregatorError};
use crate::auth::{AuthError, RequestSigner};
use crate::blockchain::{BlockchainClient, BlockchainError, GasMultiplier, TxSubmitter, Wallet};
use crate::config::validation::ValidationError;
use crate::config::{ConfigError, Credentials, SwapConfig};
use crate::workflow::{SessionDefaults, SwapSession};

/// Session type used by the running service.
pub type LiveSession = SwapSession<AggregatorClient, TxSubmitter>;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Signer setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Aggregator setup failed: {0}")]
    Aggregator(#[from] AggregatorError),

    #[error("Blockchain setup failed: {0}")]
    Blockchain(#[from] BlockchainError),
}

/// Everything the server needs, built from config and credentials.
pub struct Services {
    pub session: LiveSession,
    /// Kept for the health probe; the submitter holds its own handle.
    pub chain: BlockchainClient,
}

/// Load the signing key and reconcile it with `swap.wallet_address`.
///
/// An empty configured address means "use the key's address".
pub fn resolve_wallet(config: &SwapConfig, credentials: &Credentials) -> Result<Wallet, ConfigError> {
    let wallet = Wallet::from_private_key(&credentials.private_key, config.chain.chain_id)
        .map_err(|e| ConfigError::InvalidPrivateKey(e.to_string()))?;

    let configured = config.swap.wallet_address.trim();
    if configured.is_empty() {
        tracing::info!(wallet = %wallet.address(), "Using wallet address derived from private key");
        return Ok(wallet);
    }

    let matches = configured
        .parse::<Address>()
        .map(|a| a == wallet.address())
        .unwrap_or(false);
    if !matches {
        return Err(ConfigError::WalletMismatch {
            configured: configured.to_string(),
            derived: wallet.address().to_string(),
        });
    }
    Ok(wallet)
}

/// Build the live session.
pub async fn build_services(
    config: &SwapConfig,
    credentials: &Credentials,
) -> Result<Services, StartupError> {
    let multiplier = GasMultiplier::from_factor(config.swap.gas_multiplier).ok_or_else(|| {
        ConfigError::Validation(vec![ValidationError::new(
            "swap.gas_multiplier",
            format!("{} is not a usable multiplier", config.swap.gas_multiplier),
        )])
    })?;

    let wallet = resolve_wallet(config, credentials)?;

    let signer = RequestSigner::new(&credentials.api)?;
    let aggregator = AggregatorClient::new(&config.aggregator, signer)?;

    let chain = BlockchainClient::new(config.chain.clone()).await?;
    let submitter = TxSubmitter::new(chain.clone(), wallet, multiplier);

    tracing::info!(
        chain_id = config.chain.chain_id,
        wallet = %submitter.address(),
        gas_multiplier = %multiplier,
        slippage = config.swap.slippage,
        "Swap session ready"
    );

    let session = SwapSession::new(aggregator, submitter, SessionDefaults::from_config(config));
    Ok(Services { session, chain })
}

/// Periodically probe the RPC endpoints and publish `swap_rpc_healthy`.
pub fn spawn_rpc_probe(
    chain: BlockchainClient,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let healthy = chain.is_healthy().await;
                    if last != Some(healthy) {
                        if healthy {
                            tracing::info!(rpc_url = %chain.config().rpc_url, "RPC reachable");
                        } else {
                            tracing::warn!(rpc_url = %chain.config().rpc_url, "RPC unreachable");
                        }
                        last = Some(healthy);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("RPC probe stopping");
                    break;
                }
            }
        }
    })
}
