//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a configured level.
pub fn default_directive(log_level: &str) -> String {
    format!("dex_swap={},tower_http=info", log_level)
}

/// Initialize the global tracing subscriber.
pub fn init_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
