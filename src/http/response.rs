//! Error responses.
//!
//! # Responsibilities
//! - Map each [`ErrorKind`] to an HTTP status
//! - Render failures as JSON `{stage, kind, message, tx_hash?}`
//!
//! # Design Decisions
//! - Upstream failures are 502, a confirmation timeout is 504
//! - A hash is included whenever a transaction may exist on-chain

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::workflow::{ErrorKind, WorkflowError};

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidTransition => StatusCode::CONFLICT,
        ErrorKind::Configuration | ErrorKind::Signing => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Network | ErrorKind::Submission => StatusCode::BAD_GATEWAY,
        ErrorKind::NoRoute => StatusCode::NOT_FOUND,
        ErrorKind::ConfirmationTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Reverted => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        (status_for(self.kind), Json(self)).into_response()
    }
}

/// Failures that happen around a workflow step rather than in it.
#[derive(Debug, Serialize)]
struct ServiceError {
    kind: &'static str,
    message: String,
}

/// The session is executing a step.
pub fn busy() -> Response {
    let body = ServiceError {
        kind: "busy",
        message: "a workflow step is in progress".to_string(),
    };
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}

/// A step task ended without producing a result.
pub fn internal(message: impl Into<String>) -> Response {
    let body = ServiceError {
        kind: "internal",
        message: message.into(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
