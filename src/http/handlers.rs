//! Route handlers for the swap API.
//!
//! Every action runs on its own task holding the session lock, so a client
//! that disconnects or a request that times out cannot abandon a step half
//! way through a broadcast.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::form::INDEX_HTML;
use crate::http::request::request_id;
use crate::http::response;
use crate::http::server::{AppState, SharedSession};
use crate::workflow::{
    ErrorKind, QuoteInput, QuoteSource, SessionSnapshot, Stage, SwapExecutor, WorkflowError,
};

/// Liveness body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Body of `POST /api/v1/prepare`.
#[derive(Debug, Default, Deserialize)]
pub struct PrepareInput {
    #[serde(default)]
    pub slippage: Option<f64>,
}

/// One session action.
#[derive(Debug)]
enum Step {
    Quote(QuoteInput),
    Prepare(Option<f64>),
    Send,
    Reset,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Quote(_) => "quote",
            Step::Prepare(_) => "prepare",
            Step::Send => "send",
            Step::Reset => "reset",
        }
    }
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Current snapshot; does not wait behind a running step.
pub async fn session<Q, E>(State(state): State<AppState<Q, E>>) -> Response
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    match state.session.try_lock() {
        Ok(session) => Json(session.snapshot()).into_response(),
        Err(_) => response::busy(),
    }
}

pub async fn quote<Q, E>(
    State(state): State<AppState<Q, E>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    if body.is_empty() {
        return WorkflowError::new(Stage::Quote, ErrorKind::Validation, "missing request body")
            .into_response();
    }
    let input: QuoteInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(e) => {
            return WorkflowError::new(Stage::Quote, ErrorKind::Validation, e.to_string())
                .into_response()
        }
    };
    dispatch(&state, &headers, Step::Quote(input)).await
}

pub async fn prepare<Q, E>(
    State(state): State<AppState<Q, E>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    // An empty body means "use the configured slippage"
    let input = if body.is_empty() {
        PrepareInput::default()
    } else {
        match serde_json::from_slice::<PrepareInput>(&body) {
            Ok(input) => input,
            Err(e) => {
                return WorkflowError::new(Stage::Prepare, ErrorKind::Validation, e.to_string())
                    .into_response()
            }
        }
    };
    dispatch(&state, &headers, Step::Prepare(input.slippage)).await
}

pub async fn send<Q, E>(State(state): State<AppState<Q, E>>, headers: HeaderMap) -> Response
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    dispatch(&state, &headers, Step::Send).await
}

pub async fn reset<Q, E>(State(state): State<AppState<Q, E>>, headers: HeaderMap) -> Response
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    dispatch(&state, &headers, Step::Reset).await
}

async fn dispatch<Q, E>(state: &AppState<Q, E>, headers: &HeaderMap, step: Step) -> Response
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    let request_id = request_id(headers).to_string();
    let name = step.name();
    tracing::debug!(request_id = %request_id, step = name, "Dispatching session step");

    match tokio::spawn(apply(state.session.clone(), step)).await {
        Ok(Ok(snapshot)) => Json(snapshot).into_response(),
        Ok(Err(e)) => {
            tracing::info!(
                request_id = %request_id,
                step = name,
                kind = %e.kind,
                "Session step failed"
            );
            e.into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, step = name, error = %e, "Session step task aborted");
            response::internal(format!("{} did not complete", name))
        }
    }
}

async fn apply<Q, E>(session: SharedSession<Q, E>, step: Step) -> Result<SessionSnapshot, WorkflowError>
where
    Q: QuoteSource + 'static,
    E: SwapExecutor + 'static,
{
    let mut session = session.lock_owned().await;
    match step {
        Step::Quote(input) => {
            session.fetch_quote(&input).await?;
        }
        Step::Prepare(slippage) => {
            session.prepare_swap(slippage).await?;
        }
        Step::Send => {
            session.send().await?;
        }
        Step::Reset => session.reset(),
    }
    Ok(session.snapshot())
}
