//! Swap-aggregation API subsystem.
//!
//! # Data Flow
//! ```text
//! QuoteRequest (validated amount, tokens, chain)
//!     → client.rs quote()  → GET /quote  → QuoteResult
//! SwapRequest (+ wallet, slippage)
//!     → client.rs swap()   → GET /swap   → RawSwapData
//!     → types.rs SwapPayload::from_raw (validated, single-use)
//! ```

pub mod client;
pub mod types;

pub use client::AggregatorClient;
pub use types::{
    AggregatorError, AggregatorResult, PayloadSummary, QuoteRequest, QuoteResult, SwapPayload,
    SwapRequest, TokenInfo,
};
