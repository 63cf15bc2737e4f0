//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Drain on shutdown

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::workflow::{QuoteSource, SwapExecutor, SwapSession};

/// The one session, shared by all handlers.
pub type SharedSession<Q, E> = Arc<Mutex<SwapSession<Q, E>>>;

/// Application state injected into handlers.
pub struct AppState<Q, E> {
    pub session: SharedSession<Q, E>,
}

impl<Q, E> Clone for AppState<Q, E> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

/// HTTP server for the swap API.
pub struct HttpServer {
    router: Router,
    request_timeout: Duration,
}

impl HttpServer {
    /// Create a new HTTP server around a session.
    pub fn new<Q, E>(config: ServerConfig, session: SwapSession<Q, E>) -> Self
    where
        Q: QuoteSource + 'static,
        E: SwapExecutor + 'static,
    {
        let state = AppState {
            session: Arc::new(Mutex::new(session)),
        };
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let router = build_router(state, request_timeout);
        Self {
            router,
            request_timeout,
        }
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.request_timeout.as_secs(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router<Q, E>(state: AppState<Q, E>, request_timeout: Duration) -> Router
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/v1/session", get(handlers::session::<Q, E>))
        .route("/api/v1/quote", post(handlers::quote::<Q, E>))
        .route("/api/v1/prepare", post(handlers::prepare::<Q, E>))
        .route("/api/v1/send", post(handlers::send::<Q, E>))
        .route("/api/v1/reset", post(handlers::reset::<Q, E>))
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}
