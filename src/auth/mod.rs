//! Aggregator API authentication.

pub mod signer;

pub use signer::{AuthError, RequestSigner};
