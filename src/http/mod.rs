//! HTTP presentation layer.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (parse body, run step on the session)
//!     → response.rs (error kind → status + JSON)
//!     → Send to client
//! ```

pub mod form;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer, SharedSession};
