//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint
//! - Query chain state (chain id, block number, nonce, receipts)
//! - Broadcast signed transactions (primary endpoint only)
//! - Handle timeouts and network errors gracefully

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ChainConfig, ChainId, RejectReason,
};
use crate::observability::metrics;

/// Blockchain RPC client wrapper with failover support for reads.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: ChainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// When `verify_chain_id` is set, a reachable node reporting a different
    /// chain is fatal. An unreachable node only logs a warning.
    pub async fn new(config: ChainConfig) -> BlockchainResult<Self> {
        let client = Self::connect(config)?;

        if client.config.verify_chain_id {
            match client.verify_chain_id().await {
                Ok(()) => {
                    tracing::info!(
                        rpc_url = %client.config.rpc_url,
                        chain_id = client.config.chain_id,
                        "Blockchain client initialized"
                    );
                }
                Err(e @ BlockchainError::ChainMismatch { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Blockchain client initialized but chain verification failed"
                    );
                }
            }
        }

        Ok(client)
    }

    /// Build providers without touching the network.
    pub fn connect(config: ChainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        Ok(Self {
            providers,
            config,
            timeout_duration,
        })
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        let mut timeouts = 0;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                    timeouts += 1;
                }
            }
        }
        Err(self.exhausted(timeouts, "get chain id"))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        let mut timeouts = 0;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout");
                    timeouts += 1;
                }
            }
        }
        Err(self.exhausted(timeouts, "get block number"))
    }

    /// Get the pending transaction count (next nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        let mut timeouts = 0;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address).pending();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout");
                    timeouts += 1;
                }
            }
        }
        Err(self.exhausted(timeouts, "get transaction count"))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        let mut timeouts = 0;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout");
                    timeouts += 1;
                }
            }
        }
        Err(self.exhausted(timeouts, "get receipt"))
    }

    /// Error for a read that no provider answered.
    ///
    /// Only when every provider timed out is the failure a `Timeout`.
    fn exhausted(&self, timeouts: usize, what: &str) -> BlockchainError {
        if timeouts == self.providers.len() {
            BlockchainError::Timeout(self.config.rpc_timeout_secs)
        } else {
            BlockchainError::Rpc(format!("All RPC providers failed to {}", what))
        }
    }

    /// Broadcast a signed, EIP-2718 encoded transaction.
    ///
    /// Only the primary endpoint is used and nothing is retried: a second
    /// attempt after an ambiguous failure could double-submit.
    /// `expected_hash` is reported when the outcome is unknown.
    pub async fn send_raw_transaction(
        &self,
        raw_tx: &[u8],
        expected_hash: TxHash,
    ) -> BlockchainResult<TxHash> {
        let fut = self.providers[0].send_raw_transaction(raw_tx);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => match e.as_error_resp() {
                Some(payload) => {
                    let message = payload.message.to_string();
                    Err(BlockchainError::Rejected {
                        reason: RejectReason::classify(&message),
                        message,
                    })
                }
                None => Err(BlockchainError::BroadcastUnknown {
                    tx_hash: expected_hash,
                    message: e.to_string(),
                }),
            },
            Err(_) => Err(BlockchainError::BroadcastUnknown {
                tx_hash: expected_hash,
                message: format!("no response within {} seconds", self.config.rpc_timeout_secs),
            }),
        }
    }

    /// Check if the blockchain is reachable and healthy.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Get the number of confirmation blocks required.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
