//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Why a node refused a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InsufficientFunds,
    NonceConflict,
    Underpriced,
    Other,
}

impl RejectReason {
    /// Classify a node's error message. Geth, Erigon, Nethermind and Anvil
    /// wordings are covered.
    pub fn classify(message: &str) -> Self {
        let m = message.to_ascii_lowercase();
        if m.contains("insufficient funds") {
            RejectReason::InsufficientFunds
        } else if m.contains("nonce too low")
            || m.contains("nonce too high")
            || m.contains("already known")
            || m.contains("replacement transaction")
            || m.contains("invalid nonce")
        {
            RejectReason::NonceConflict
        } else if m.contains("underpriced")
            || m.contains("fee cap")
            || m.contains("less than block base fee")
            || m.contains("gas price too low")
        {
            RejectReason::Underpriced
        } else {
            RejectReason::Other
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::InsufficientFunds => "insufficient funds",
            RejectReason::NonceConflict => "nonce conflict",
            RejectReason::Underpriced => "gas underpriced",
            RejectReason::Other => "rejected",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The transaction could not be built or signed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Adjusted gas price exceeded the configured maximum.
    #[error("Gas price {gas_price_wei} wei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { gas_price_wei: u128, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// The node refused the signed transaction.
    #[error("Broadcast rejected ({reason}): {message}")]
    Rejected { reason: RejectReason, message: String },

    /// Broadcast outcome unknown (timeout or transport failure after signing).
    /// The transaction may or may not be in the mempool.
    #[error("Broadcast of {tx_hash} has unknown outcome: {message}")]
    BroadcastUnknown { tx_hash: TxHash, message: String },

    /// Transaction was not confirmed within the configured wait.
    #[error("Transaction {tx_hash} not confirmed within {waited_secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// Transaction was included but reverted.
    #[error("Transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: TxHash, block_number: u64 },
}

impl BlockchainError {
    /// Hash of the affected transaction, when one exists.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            BlockchainError::BroadcastUnknown { tx_hash, .. }
            | BlockchainError::ConfirmationTimeout { tx_hash, .. }
            | BlockchainError::Reverted { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Confirmation receipt for an included swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub confirmations: u32,
}
