//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config + credentials → wallet check → aggregator → RPC → session
//!
//! Shutdown (shutdown.rs):
//!     Trigger → server stops accepting → in-flight steps finish → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_services, LiveSession, Services, StartupError};
