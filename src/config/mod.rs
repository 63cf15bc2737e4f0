//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SwapConfig (validated, immutable)
//!
//! environment (DEX_SWAP_*)
//!     → credentials.rs (presence checks)
//!     → Credentials (immutable, redacted Debug)
//! ```
//!
//! # Design Decisions
//! - Loaded once at startup; no reload
//! - All fields have defaults to allow minimal configs
//! - Secrets never live in the config file

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;

pub use credentials::{ApiCredentials, Credentials};
pub use loader::{load_config, load_with_credentials, ConfigError};
pub use schema::{
    AggregatorConfig, ChainConfig, ObservabilityConfig, ServerConfig, SwapConfig, SwapDefaults,
};
