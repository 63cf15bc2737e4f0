//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Credentials (private key from environment)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts)
//!     → transaction.rs (gas adjust, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Broadcasts are never retried

pub mod client;
pub mod gas;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use gas::GasMultiplier;
pub use transaction::TxSubmitter;
pub use types::{BlockchainError, BlockchainResult, ChainId, RejectReason, TxReceipt};
pub use wallet::Wallet;
