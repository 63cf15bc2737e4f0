//! Authenticated HTTP client for the swap-aggregation API.
//!
//! # Responsibilities
//! - Sign every request (see [`crate::auth::signer`])
//! - Enforce the configured request timeout
//! - Unwrap the `{code, msg, data}` envelope and take the first result
//!
//! Both endpoints are read-only; neither is retried here.

use std::time::{Duration, Instant};

use reqwest::Method;

use crate::aggregator::types::{
    AggregatorError, AggregatorResult, ApiResponse, QuoteRequest, QuoteResult, RawSwapData,
    SwapPayload, SwapRequest,
};
use crate::auth::RequestSigner;
use crate::config::AggregatorConfig;
use crate::observability::metrics;

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Swap-aggregation API client.
#[derive(Clone)]
pub struct AggregatorClient {
    http: reqwest::Client,
    signer: RequestSigner,
    /// Base URL without trailing slash.
    base_url: String,
    /// Path component of the base URL, prefixed to every signed path.
    base_path: String,
    timeout_secs: u64,
}

impl AggregatorClient {
    /// Create a client with its own connection pool.
    pub fn new(config: &AggregatorConfig, signer: RequestSigner) -> AggregatorResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AggregatorError::Request(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_http_client(config, signer, http)
    }

    /// Create a client around an existing `reqwest::Client`.
    ///
    /// The caller's client should carry its own timeout; the configured value
    /// is only used for error reporting.
    pub fn with_http_client(
        config: &AggregatorConfig,
        signer: RequestSigner,
        http: reqwest::Client,
    ) -> AggregatorResult<Self> {
        let url: url::Url = config.base_url.parse().map_err(|e| {
            AggregatorError::Validation(format!("Invalid aggregator URL '{}': {}", config.base_url, e))
        })?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let base_path = url.path().trim_end_matches('/').to_string();

        tracing::info!(base_url = %base_url, "Aggregator client initialized");

        Ok(Self {
            http,
            signer,
            base_url,
            base_path,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Path that gets signed for `path_and_query` (base path included).
    pub fn request_path(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_path, path_and_query)
    }

    /// Fetch a quote. Returns the first element of the result list.
    pub async fn quote(&self, request: &QuoteRequest) -> AggregatorResult<QuoteResult> {
        let data = self.get("quote", &request.path()).await?;

        let first = data
            .into_iter()
            .next()
            .ok_or_else(|| AggregatorError::NoRoute(request.describe()))?;

        let quote: QuoteResult = serde_json::from_value(first)
            .map_err(|e| AggregatorError::Decode(format!("quote result: {}", e)))?;

        tracing::info!(
            from_amount = %quote.from_token_amount,
            to_amount = %quote.to_token_amount,
            chain_id = request.chain_id,
            "Quote received"
        );
        Ok(quote)
    }

    /// Fetch and validate a ready-to-sign swap transaction.
    pub async fn swap(&self, request: &SwapRequest) -> AggregatorResult<SwapPayload> {
        let data = self.get("swap", &request.path()).await?;

        let first = data
            .into_iter()
            .next()
            .ok_or_else(|| AggregatorError::NoRoute(request.quote.describe()))?;

        let raw: RawSwapData = serde_json::from_value(first)
            .map_err(|e| AggregatorError::MalformedPayload(e.to_string()))?;
        let payload = SwapPayload::from_raw(raw, request.user_wallet_address)?;

        tracing::info!(
            to = %payload.to,
            gas_limit = payload.gas_limit,
            gas_price = payload.gas_price,
            data_len = payload.data.len(),
            "Swap payload received"
        );
        Ok(payload)
    }

    /// Signed GET returning the envelope's `data` list.
    async fn get(&self, endpoint: &'static str, path_and_query: &str) -> AggregatorResult<Vec<serde_json::Value>> {
        let request_path = self.request_path(path_and_query);
        let url = format!("{}{}", self.base_url, path_and_query);
        let timestamp = RequestSigner::timestamp();
        let headers = self.signer.headers(&timestamp, &Method::GET, &request_path)?;

        tracing::debug!(endpoint = endpoint, path = %request_path, "Aggregator request");

        let start = Instant::now();
        let result = self.http.get(&url).headers(headers).send().await;
        metrics::record_aggregator_request(endpoint, start);

        let response = result.map_err(|e| self.map_transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            tracing::warn!(endpoint = endpoint, status = status.as_u16(), "Aggregator returned error status");
            return Err(AggregatorError::HttpStatus {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        let envelope: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| AggregatorError::Decode(e.to_string()))?;

        if !envelope.is_success() {
            tracing::warn!(endpoint = endpoint, code = %envelope.code_string(), msg = %envelope.msg, "Aggregator rejected request");
            return Err(AggregatorError::Api {
                code: envelope.code_string(),
                msg: envelope.msg,
            });
        }

        Ok(envelope.data)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AggregatorError {
        if e.is_timeout() {
            AggregatorError::Timeout(self.timeout_secs)
        } else {
            AggregatorError::Request(e.to_string())
        }
    }
}

impl std::fmt::Debug for AggregatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
