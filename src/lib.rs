//! Authenticated DEX aggregator swap client.

pub mod aggregator;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod workflow;

pub use config::schema::SwapConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use workflow::{SwapSession, WorkflowError};
