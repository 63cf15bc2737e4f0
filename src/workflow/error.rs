//! User-facing error taxonomy.
//!
//! Subsystem errors ([`AggregatorError`], [`BlockchainError`]) are folded
//! into one [`WorkflowError`] that always names the failing [`Stage`].

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregator::AggregatorError;
use crate::blockchain::BlockchainError;
use crate::workflow::state::{Phase, Stage};

/// Error category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Network,
    NoRoute,
    Signing,
    Submission,
    ConfirmationTimeout,
    Reverted,
    InvalidTransition,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::NoRoute => "no_route",
            ErrorKind::Signing => "signing",
            ErrorKind::Submission => "submission",
            ErrorKind::ConfirmationTimeout => "confirmation_timeout",
            ErrorKind::Reverted => "reverted",
            ErrorKind::InvalidTransition => "invalid_transition",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&AggregatorError> for ErrorKind {
    fn from(e: &AggregatorError) -> Self {
        match e {
            AggregatorError::Validation(_) => ErrorKind::Validation,
            AggregatorError::Request(_)
            | AggregatorError::Timeout(_)
            | AggregatorError::HttpStatus { .. }
            | AggregatorError::Api { .. }
            | AggregatorError::Decode(_) => ErrorKind::Network,
            AggregatorError::NoRoute(_) => ErrorKind::NoRoute,
            AggregatorError::MalformedPayload(_) => ErrorKind::Signing,
            AggregatorError::Auth(_) => ErrorKind::Configuration,
        }
    }
}

impl From<&BlockchainError> for ErrorKind {
    fn from(e: &BlockchainError) -> Self {
        match e {
            BlockchainError::Rpc(_) | BlockchainError::Timeout(_) => ErrorKind::Network,
            BlockchainError::Wallet(_) | BlockchainError::Signing(_) => ErrorKind::Signing,
            BlockchainError::ChainMismatch { .. } => ErrorKind::Configuration,
            BlockchainError::GasPriceTooHigh { .. }
            | BlockchainError::Rejected { .. }
            | BlockchainError::BroadcastUnknown { .. } => ErrorKind::Submission,
            BlockchainError::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
            BlockchainError::Reverted { .. } => ErrorKind::Reverted,
        }
    }
}

/// A failure in one workflow stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{stage} failed ({kind}): {message}")]
pub struct WorkflowError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
    /// Set when a transaction may exist on-chain; check it before retrying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl WorkflowError {
    pub fn new(stage: Stage, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
            tx_hash: None,
        }
    }

    pub fn aggregator(stage: Stage, e: AggregatorError) -> Self {
        Self::new(stage, ErrorKind::from(&e), e.to_string())
    }

    pub fn blockchain(stage: Stage, e: BlockchainError) -> Self {
        Self {
            stage,
            kind: ErrorKind::from(&e),
            tx_hash: e.tx_hash(),
            message: e.to_string(),
        }
    }

    /// A step was requested from a state that does not allow it.
    pub fn invalid_transition(stage: Stage, from: Phase) -> Self {
        Self::new(
            stage,
            ErrorKind::InvalidTransition,
            format!("cannot {} while {}", stage, from),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether this error moved the session to `Errored`.
    ///
    /// Input and ordering mistakes leave the session where it was.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind, ErrorKind::Validation | ErrorKind::InvalidTransition)
    }
}
