//! Swap workflow state machine.
//!
//! # States
//! - Idle: nothing fetched yet
//! - QuoteFetched: an estimate is on screen
//! - SwapPrepared: a signed-ready payload is held
//! - Submitted: broadcast accepted, waiting for inclusion
//! - Confirmed: included and deep enough (terminal)
//! - Errored: a stage failed (terminal)
//!
//! # State Transitions
//! ```text
//! Idle → QuoteFetched → SwapPrepared → Submitted → Confirmed
//!   └──────┴──────────────┴─────────────┴──→ Errored
//! QuoteFetched → QuoteFetched   (re-quote)
//! any → Idle                    (reset)
//! ```

use serde::{Deserialize, Serialize};

use crate::aggregator::{QuoteRequest, QuoteResult, SwapPayload, SwapRequest};
use crate::blockchain::TxReceipt;
use crate::workflow::error::WorkflowError;
use alloy::primitives::TxHash;

/// Workflow step in which something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Quote,
    Prepare,
    Submit,
    Confirm,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Quote => "quote",
            Stage::Prepare => "prepare",
            Stage::Submit => "submit",
            Stage::Confirm => "confirm",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-free discriminant of [`WorkflowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    QuoteFetched,
    SwapPrepared,
    Submitted,
    Confirmed,
    Errored,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::QuoteFetched => "quote_fetched",
            Phase::SwapPrepared => "swap_prepared",
            Phase::Submitted => "submitted",
            Phase::Confirmed => "confirmed",
            Phase::Errored => "errored",
        }
    }

    /// True for states that end an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Confirmed | Phase::Errored)
    }

    /// Whether the machine may move from `self` to `next` without a reset.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (Idle, QuoteFetched) => true,
            (QuoteFetched, QuoteFetched) => true,
            (QuoteFetched, SwapPrepared) => true,
            (SwapPrepared, Submitted) => true,
            (Submitted, Confirmed) => true,
            (from, Errored) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow state with the data each step carries forward.
#[derive(Debug, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    QuoteFetched {
        request: QuoteRequest,
        quote: QuoteResult,
    },
    SwapPrepared {
        request: SwapRequest,
        payload: SwapPayload,
    },
    Submitted {
        tx_hash: TxHash,
    },
    Confirmed {
        receipt: TxReceipt,
    },
    Errored {
        error: WorkflowError,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::QuoteFetched { .. } => Phase::QuoteFetched,
            WorkflowState::SwapPrepared { .. } => Phase::SwapPrepared,
            WorkflowState::Submitted { .. } => Phase::Submitted,
            WorkflowState::Confirmed { .. } => Phase::Confirmed,
            WorkflowState::Errored { .. } => Phase::Errored,
        }
    }
}
