//! Quote → prepare → send workflow.
//!
//! # Data Flow
//! ```text
//! QuoteInput ──▶ QuoteSource::quote ──▶ QuoteFetched
//!            ──▶ QuoteSource::swap  ──▶ SwapPrepared (single-use payload)
//!            ──▶ SwapExecutor::submit ──▶ Submitted
//!            ──▶ SwapExecutor::confirm ──▶ Confirmed
//! ```
//!
//! Any fatal failure lands in `Errored` carrying a [`WorkflowError`].

pub mod error;
pub mod session;
pub mod state;

pub use error::{ErrorKind, WorkflowError};
pub use session::{
    QuoteInput, QuoteSource, SessionDefaults, SessionSnapshot, SwapExecutor, SwapSession,
};
pub use state::{Phase, Stage, WorkflowState};
