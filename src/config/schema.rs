//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the swap
//! service. All types derive Serde traits for deserialization from config files.
//! Credentials are deliberately absent: they come from the environment only
//! (see [`crate::config::credentials`]).

use serde::{Deserialize, Serialize};

/// Sentinel address aggregators use for the chain's native token.
pub const NATIVE_TOKEN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// USDC on Ethereum mainnet.
pub const USDC_MAINNET_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SwapConfig {
    /// Swap-aggregation API settings.
    pub aggregator: AggregatorConfig,

    /// Chain and RPC settings.
    pub chain: ChainConfig,

    /// Default swap parameters.
    pub swap: SwapDefaults,

    /// HTTP front-end settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Swap-aggregation API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Base URL; `/quote` and `/swap` are appended to it.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.okx.com/api/v5/dex/aggregator".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Chain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// JSON-RPC endpoint URL. Broadcasts only ever go here.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, used for read-only calls.
    pub failover_urls: Vec<String>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required before a swap counts as confirmed.
    pub confirmation_blocks: u32,

    /// Upper bound on the confirmation wait, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum gas price in gwei after the multiplier is applied.
    pub max_gas_price_gwei: u64,

    /// Check `eth_chainId` against `chain_id` at startup.
    pub verify_chain_id: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 2000,
            max_gas_price_gwei: 500,
            verify_chain_id: true,
        }
    }
}

/// Default parameters for a swap.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwapDefaults {
    /// Token sold.
    pub from_token_address: String,

    /// Token bought.
    pub to_token_address: String,

    /// Wallet that signs and receives. Derived from the private key when empty.
    pub wallet_address: String,

    /// Slippage tolerance as a fraction (0.03 = 3%).
    pub slippage: f64,

    /// Factor applied to the aggregator's gas limit and gas price (1.5 = +50%).
    pub gas_multiplier: f64,
}

impl Default for SwapDefaults {
    fn default() -> Self {
        Self {
            from_token_address: NATIVE_TOKEN_ADDRESS.to_string(),
            to_token_address: USDC_MAINNET_ADDRESS.to_string(),
            wallet_address: String::new(),
            slippage: 0.03,
            gas_multiplier: 1.5,
        }
    }
}

/// HTTP front-end configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Request timeout in seconds. Must outlast the confirmation wait.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
