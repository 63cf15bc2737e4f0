//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, slippage in (0, 1), multiplier >= 1)
//! - Check that addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SwapConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use alloy::primitives::Address;

use crate::config::schema::SwapConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `swap.slippage`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SwapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.aggregator.base_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("aggregator.base_url", "not a valid URL"));
    }
    if config.aggregator.request_timeout_secs == 0 {
        errors.push(ValidationError::new("aggregator.request_timeout_secs", "must be > 0"));
    }

    let chain = &config.chain;
    if chain.chain_id == 0 {
        errors.push(ValidationError::new("chain.chain_id", "must be > 0"));
    }
    if chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("chain.rpc_url", "not a valid URL"));
    }
    for url in &chain.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "chain.failover_urls",
                format!("'{}' is not a valid URL", url),
            ));
        }
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be > 0"));
    }
    if chain.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.confirmation_timeout_secs", "must be > 0"));
    }
    if chain.poll_interval_ms == 0 {
        errors.push(ValidationError::new("chain.poll_interval_ms", "must be > 0"));
    }

    let swap = &config.swap;
    if swap.from_token_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new("swap.from_token_address", "not a valid address"));
    }
    if swap.to_token_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new("swap.to_token_address", "not a valid address"));
    }
    if !swap.wallet_address.is_empty() && swap.wallet_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new("swap.wallet_address", "not a valid address"));
    }
    if !(swap.slippage > 0.0 && swap.slippage < 1.0) {
        errors.push(ValidationError::new("swap.slippage", "must be between 0 and 1 (exclusive)"));
    }
    if !(swap.gas_multiplier.is_finite() && swap.gas_multiplier >= 1.0) {
        errors.push(ValidationError::new("swap.gas_multiplier", "must be >= 1.0"));
    }

    // A send makes two RPC calls before it starts waiting for confirmation
    let send_budget = chain
        .confirmation_timeout_secs
        .saturating_add(chain.rpc_timeout_secs.saturating_mul(2));
    if config.server.request_timeout_secs < send_budget {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            format!(
                "must be at least chain.confirmation_timeout_secs + 2 * chain.rpc_timeout_secs ({})",
                send_budget
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
