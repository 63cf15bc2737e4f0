//! One user's quote → prepare → send workflow.
//!
//! The session owns the current [`WorkflowState`] and drives the aggregator
//! and the submitter behind two traits, so the state machine can be exercised
//! without a network.

use std::future::Future;

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::{
    AggregatorClient, AggregatorResult, PayloadSummary, QuoteRequest, QuoteResult, SwapPayload,
    SwapRequest,
};
use crate::blockchain::{BlockchainResult, TxReceipt, TxSubmitter};
use crate::config::SwapConfig;
use crate::observability::metrics;
use crate::workflow::error::WorkflowError;
use crate::workflow::state::{Phase, Stage, WorkflowState};

/// Read-only source of quotes and swap payloads.
pub trait QuoteSource: Send + Sync {
    fn quote(&self, request: &QuoteRequest) -> impl Future<Output = AggregatorResult<QuoteResult>> + Send;

    fn swap(&self, request: &SwapRequest) -> impl Future<Output = AggregatorResult<SwapPayload>> + Send;
}

/// Side-effecting half: signs, broadcasts and confirms.
pub trait SwapExecutor: Send + Sync {
    /// Address that signs, and that the aggregator should build for.
    fn wallet_address(&self) -> Address;

    fn submit(&self, payload: SwapPayload) -> impl Future<Output = BlockchainResult<TxHash>> + Send;

    fn confirm(&self, tx_hash: TxHash) -> impl Future<Output = BlockchainResult<TxReceipt>> + Send;
}

impl QuoteSource for AggregatorClient {
    fn quote(&self, request: &QuoteRequest) -> impl Future<Output = AggregatorResult<QuoteResult>> + Send {
        AggregatorClient::quote(self, request)
    }

    fn swap(&self, request: &SwapRequest) -> impl Future<Output = AggregatorResult<SwapPayload>> + Send {
        AggregatorClient::swap(self, request)
    }
}

impl SwapExecutor for TxSubmitter {
    fn wallet_address(&self) -> Address {
        self.address()
    }

    fn submit(&self, payload: SwapPayload) -> impl Future<Output = BlockchainResult<TxHash>> + Send {
        TxSubmitter::submit(self, payload)
    }

    fn confirm(&self, tx_hash: TxHash) -> impl Future<Output = BlockchainResult<TxReceipt>> + Send {
        self.wait_for_confirmation(tx_hash)
    }
}

/// Values used when a request leaves a field out.
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub chain_id: u64,
    pub from_token_address: String,
    pub to_token_address: String,
    pub slippage: f64,
}

impl SessionDefaults {
    pub fn from_config(config: &SwapConfig) -> Self {
        Self {
            chain_id: config.chain.chain_id,
            from_token_address: config.swap.from_token_address.clone(),
            to_token_address: config.swap.to_token_address.clone(),
            slippage: config.swap.slippage,
        }
    }
}

/// Input for the quote step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteInput {
    /// Amount in the source token's smallest unit.
    pub amount: String,
    #[serde(default)]
    pub from_token_address: Option<String>,
    #[serde(default)]
    pub to_token_address: Option<String>,
}

/// Serializable view of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub attempt_id: Uuid,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<QuoteResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<TxReceipt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WorkflowError>,
}

/// A single swap workflow.
pub struct SwapSession<Q, E> {
    source: Q,
    executor: E,
    defaults: SessionDefaults,
    state: WorkflowState,
    attempt_id: Uuid,
}

impl<Q: QuoteSource, E: SwapExecutor> SwapSession<Q, E> {
    pub fn new(source: Q, executor: E, defaults: SessionDefaults) -> Self {
        Self {
            source,
            executor,
            defaults,
            state: WorkflowState::Idle,
            attempt_id: Uuid::new_v4(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    /// Step 1: fetch a quote. Allowed from `Idle` or to refresh a quote.
    pub async fn fetch_quote(&mut self, input: &QuoteInput) -> Result<QuoteResult, WorkflowError> {
        let phase = self.phase();
        if !phase.can_transition_to(Phase::QuoteFetched) {
            return Err(self.reject(WorkflowError::invalid_transition(Stage::Quote, phase)));
        }

        let from = input
            .from_token_address
            .as_deref()
            .unwrap_or(&self.defaults.from_token_address);
        let to = input
            .to_token_address
            .as_deref()
            .unwrap_or(&self.defaults.to_token_address);
        let request = match QuoteRequest::new(&input.amount, from, to, self.defaults.chain_id) {
            Ok(r) => r,
            Err(e) => return Err(self.fail(WorkflowError::aggregator(Stage::Quote, e))),
        };

        tracing::info!(attempt = %self.attempt_id, request = %request.describe(), "Fetching quote");

        match self.source.quote(&request).await {
            Ok(quote) => {
                self.state = WorkflowState::QuoteFetched {
                    request,
                    quote: quote.clone(),
                };
                metrics::record_stage(Stage::Quote.as_str(), "ok");
                Ok(quote)
            }
            Err(e) => Err(self.fail(WorkflowError::aggregator(Stage::Quote, e))),
        }
    }

    /// Step 2: fetch the swap payload for the current quote.
    pub async fn prepare_swap(&mut self, slippage: Option<f64>) -> Result<PayloadSummary, WorkflowError> {
        let quote_request = match &self.state {
            WorkflowState::QuoteFetched { request, .. } => request.clone(),
            other => {
                let phase = other.phase();
                return Err(self.reject(WorkflowError::invalid_transition(Stage::Prepare, phase)));
            }
        };

        let slippage = slippage.unwrap_or(self.defaults.slippage);
        let request = match SwapRequest::new(quote_request, self.executor.wallet_address(), slippage) {
            Ok(r) => r,
            Err(e) => return Err(self.fail(WorkflowError::aggregator(Stage::Prepare, e))),
        };

        tracing::info!(attempt = %self.attempt_id, slippage = slippage, "Preparing swap");

        match self.source.swap(&request).await {
            Ok(payload) => {
                let summary = payload.summary();
                self.state = WorkflowState::SwapPrepared { request, payload };
                metrics::record_stage(Stage::Prepare.as_str(), "ok");
                Ok(summary)
            }
            Err(e) => Err(self.fail(WorkflowError::aggregator(Stage::Prepare, e))),
        }
    }

    /// Step 3a: sign and broadcast the prepared payload.
    ///
    /// The payload leaves the session here; whatever happens, it cannot be
    /// submitted a second time.
    pub async fn submit(&mut self) -> Result<TxHash, WorkflowError> {
        let payload = match std::mem::take(&mut self.state) {
            WorkflowState::SwapPrepared { payload, .. } => payload,
            other => {
                let phase = other.phase();
                self.state = other;
                return Err(self.reject(WorkflowError::invalid_transition(Stage::Submit, phase)));
            }
        };

        tracing::info!(attempt = %self.attempt_id, to = %payload.to, "Submitting swap");

        match self.executor.submit(payload).await {
            Ok(tx_hash) => {
                self.state = WorkflowState::Submitted { tx_hash };
                metrics::record_stage(Stage::Submit.as_str(), "ok");
                tracing::info!(attempt = %self.attempt_id, tx_hash = %tx_hash, "Swap broadcast");
                Ok(tx_hash)
            }
            Err(e) => Err(self.fail(WorkflowError::blockchain(Stage::Submit, e))),
        }
    }

    /// Step 3b: wait for the submitted transaction to confirm.
    pub async fn confirm(&mut self) -> Result<TxReceipt, WorkflowError> {
        let tx_hash = match &self.state {
            WorkflowState::Submitted { tx_hash } => *tx_hash,
            other => {
                let phase = other.phase();
                return Err(self.reject(WorkflowError::invalid_transition(Stage::Confirm, phase)));
            }
        };

        match self.executor.confirm(tx_hash).await {
            Ok(receipt) => {
                tracing::info!(
                    attempt = %self.attempt_id,
                    tx_hash = %tx_hash,
                    block_number = receipt.block_number,
                    "Swap confirmed"
                );
                self.state = WorkflowState::Confirmed {
                    receipt: receipt.clone(),
                };
                metrics::record_stage(Stage::Confirm.as_str(), "ok");
                Ok(receipt)
            }
            Err(e) => Err(self.fail(WorkflowError::blockchain(Stage::Confirm, e))),
        }
    }

    /// Step 3: submit then confirm.
    pub async fn send(&mut self) -> Result<TxReceipt, WorkflowError> {
        self.submit().await?;
        self.confirm().await
    }

    /// Start a new attempt from `Idle`.
    pub fn reset(&mut self) {
        if self.phase() == Phase::Submitted {
            tracing::warn!(attempt = %self.attempt_id, "Reset while a transaction is unconfirmed");
        }
        self.state = WorkflowState::Idle;
        self.attempt_id = Uuid::new_v4();
        tracing::info!(attempt = %self.attempt_id, "Session reset");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            attempt_id: self.attempt_id,
            phase: self.phase(),
            quote: None,
            payload: None,
            tx_hash: None,
            receipt: None,
            error: None,
        };
        match &self.state {
            WorkflowState::Idle => {}
            WorkflowState::QuoteFetched { quote, .. } => snapshot.quote = Some(quote.clone()),
            WorkflowState::SwapPrepared { payload, .. } => {
                snapshot.quote = Some(payload.router_result.clone());
                snapshot.payload = Some(payload.summary());
            }
            WorkflowState::Submitted { tx_hash } => snapshot.tx_hash = Some(*tx_hash),
            WorkflowState::Confirmed { receipt } => {
                snapshot.tx_hash = Some(receipt.tx_hash);
                snapshot.receipt = Some(receipt.clone());
            }
            WorkflowState::Errored { error } => {
                snapshot.tx_hash = error.tx_hash;
                snapshot.error = Some(error.clone());
            }
        }
        snapshot
    }

    /// Record a failure; fatal ones move the session to `Errored`.
    fn fail(&mut self, error: WorkflowError) -> WorkflowError {
        if !error.is_fatal() {
            return self.reject(error);
        }
        tracing::warn!(
            attempt = %self.attempt_id,
            stage = %error.stage,
            kind = %error.kind,
            error = %error.message,
            "Swap stage failed"
        );
        metrics::record_stage(error.stage.as_str(), error.kind.as_str());
        self.state = WorkflowState::Errored {
            error: error.clone(),
        };
        error
    }

    /// Report a rejected request without touching the state.
    fn reject(&self, error: WorkflowError) -> WorkflowError {
        tracing::info!(attempt = %self.attempt_id, stage = %error.stage, error = %error.message, "Request rejected");
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AggregatorError;
    use crate::blockchain::{BlockchainError, RejectReason};
    use crate::config::schema::{NATIVE_TOKEN_ADDRESS, USDC_MAINNET_ADDRESS};
    use crate::workflow::error::ErrorKind;
    use alloy::primitives::{Bytes, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const WALLET: Address = Address::repeat_byte(0x77);

    fn quote_result() -> QuoteResult {
        QuoteResult {
            from_token_amount: "1000000000000000000".into(),
            to_token_amount: "2500000000".into(),
            estimate_gas_fee: None,
            price_impact_percentage: None,
            from_token: None,
            to_token: None,
            dex_router_list: Vec::new(),
        }
    }

    #[derive(Default)]
    struct MockSource {
        quote_err: Option<AggregatorError>,
        swap_err: Option<AggregatorError>,
        requests: Mutex<Vec<String>>,
    }

    impl QuoteSource for MockSource {
        async fn quote(&self, request: &QuoteRequest) -> AggregatorResult<QuoteResult> {
            self.requests.lock().unwrap().push(request.path());
            match &self.quote_err {
                Some(e) => Err(e.clone()),
                None => Ok(quote_result()),
            }
        }

        async fn swap(&self, request: &SwapRequest) -> AggregatorResult<SwapPayload> {
            self.requests.lock().unwrap().push(request.path());
            match &self.swap_err {
                Some(e) => Err(e.clone()),
                None => Ok(SwapPayload {
                    to: Address::repeat_byte(0x11),
                    data: Bytes::from_static(&[1, 2, 3]),
                    value: U256::from(1u64),
                    gas_limit: 200_000,
                    gas_price: 1_000_000_000,
                    min_receive_amount: None,
                    router_result: quote_result(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct MockExecutor {
        submit_err: Option<BlockchainError>,
        confirm_err: Option<BlockchainError>,
        submits: Arc<AtomicUsize>,
    }

    impl SwapExecutor for MockExecutor {
        fn wallet_address(&self) -> Address {
            WALLET
        }

        async fn submit(&self, _payload: SwapPayload) -> BlockchainResult<TxHash> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            match &self.submit_err {
                Some(e) => Err(e.clone()),
                None => Ok(TxHash::repeat_byte(0xaa)),
            }
        }

        async fn confirm(&self, tx_hash: TxHash) -> BlockchainResult<TxReceipt> {
            match &self.confirm_err {
                Some(e) => Err(e.clone()),
                None => Ok(TxReceipt {
                    tx_hash,
                    block_number: 100,
                    gas_used: 150_000,
                    confirmations: 1,
                }),
            }
        }
    }

    fn defaults() -> SessionDefaults {
        SessionDefaults {
            chain_id: 1,
            from_token_address: NATIVE_TOKEN_ADDRESS.into(),
            to_token_address: USDC_MAINNET_ADDRESS.into(),
            slippage: 0.03,
        }
    }

    fn session(source: MockSource, executor: MockExecutor) -> SwapSession<MockSource, MockExecutor> {
        SwapSession::new(source, executor, defaults())
    }

    fn one_eth() -> QuoteInput {
        QuoteInput {
            amount: "1000000000000000000".into(),
            ..QuoteInput::default()
        }
    }

    #[tokio::test]
    async fn test_happy_path() {
        let mut s = session(MockSource::default(), MockExecutor::default());

        let quote = s.fetch_quote(&one_eth()).await.unwrap();
        assert_eq!(quote.to_token_amount, "2500000000");
        assert_eq!(s.phase(), Phase::QuoteFetched);

        let summary = s.prepare_swap(None).await.unwrap();
        assert_eq!(summary.gas_limit, 200_000);
        assert_eq!(s.phase(), Phase::SwapPrepared);

        let receipt = s.send().await.unwrap();
        assert_eq!(receipt.tx_hash, TxHash::repeat_byte(0xaa));
        assert_eq!(s.phase(), Phase::Confirmed);

        let snap = s.snapshot();
        assert_eq!(snap.tx_hash, Some(TxHash::repeat_byte(0xaa)));
        assert_eq!(snap.receipt.unwrap().block_number, 100);
    }

    #[tokio::test]
    async fn test_prepare_uses_wallet_and_slippage() {
        let mut s = session(MockSource::default(), MockExecutor::default());
        s.fetch_quote(&one_eth()).await.unwrap();
        s.prepare_swap(Some(0.005)).await.unwrap();

        let requests = s.source.requests.lock().unwrap();
        assert!(requests[1].starts_with("/swap?amount=1000000000000000000&chainId=1&"));
        assert!(requests[1].contains(&format!("userWalletAddress={}", WALLET)));
        assert!(requests[1].ends_with("&slippage=0.005"));
    }

    #[tokio::test]
    async fn test_cannot_skip_stages() {
        let mut s = session(MockSource::default(), MockExecutor::default());

        let err = s.submit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
        assert_eq!(err.stage, Stage::Submit);
        assert_eq!(s.phase(), Phase::Idle);

        let err = s.prepare_swap(None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);

        s.fetch_quote(&one_eth()).await.unwrap();
        let err = s.send().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
        assert_eq!(s.phase(), Phase::QuoteFetched);
        assert_eq!(s.executor.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_requote_allowed() {
        let mut s = session(MockSource::default(), MockExecutor::default());
        s.fetch_quote(&one_eth()).await.unwrap();
        s.fetch_quote(&QuoteInput { amount: "5".into(), ..QuoteInput::default() })
            .await
            .unwrap();
        assert_eq!(s.phase(), Phase::QuoteFetched);
    }

    #[tokio::test]
    async fn test_validation_error_keeps_state() {
        let mut s = session(MockSource::default(), MockExecutor::default());
        let err = s
            .fetch_quote(&QuoteInput { amount: "1.5".into(), ..QuoteInput::default() })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_route_moves_to_errored() {
        let source = MockSource {
            quote_err: Some(AggregatorError::NoRoute("x".into())),
            ..MockSource::default()
        };
        let mut s = session(source, MockExecutor::default());

        let err = s.fetch_quote(&one_eth()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoRoute);
        assert_eq!(s.phase(), Phase::Errored);

        // Errored is terminal until reset
        let err = s.fetch_quote(&one_eth()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);

        s.reset();
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_payload_consumed_once_even_on_failure() {
        let executor = MockExecutor {
            submit_err: Some(BlockchainError::Rejected {
                reason: RejectReason::NonceConflict,
                message: "nonce too low".into(),
            }),
            ..MockExecutor::default()
        };
        let submits = executor.submits.clone();
        let mut s = session(MockSource::default(), executor);
        s.fetch_quote(&one_eth()).await.unwrap();
        s.prepare_swap(None).await.unwrap();

        let err = s.send().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Submission);
        assert_eq!(err.stage, Stage::Submit);
        assert_eq!(s.phase(), Phase::Errored);

        let err = s.submit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
        assert_eq!(submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_not_retried() {
        let hash = TxHash::repeat_byte(0xaa);
        let executor = MockExecutor {
            confirm_err: Some(BlockchainError::ConfirmationTimeout {
                tx_hash: hash,
                waited_secs: 120,
            }),
            ..MockExecutor::default()
        };
        let submits = executor.submits.clone();
        let mut s = session(MockSource::default(), executor);
        s.fetch_quote(&one_eth()).await.unwrap();
        s.prepare_swap(None).await.unwrap();

        let err = s.send().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConfirmationTimeout);
        assert_eq!(err.stage, Stage::Confirm);
        assert_eq!(err.tx_hash, Some(hash));
        assert_eq!(s.phase(), Phase::Errored);
        assert_eq!(s.snapshot().tx_hash, Some(hash));
        assert_eq!(submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_payload_fails_prepare() {
        let source = MockSource {
            swap_err: Some(AggregatorError::MalformedPayload("tx.to".into())),
            ..MockSource::default()
        };
        let mut s = session(source, MockExecutor::default());
        s.fetch_quote(&one_eth()).await.unwrap();
        let err = s.prepare_swap(None).await.unwrap_err();
        assert_eq!(err.stage, Stage::Prepare);
        assert_eq!(err.kind, ErrorKind::Signing);
        assert_eq!(s.phase(), Phase::Errored);
    }

    #[tokio::test]
    async fn test_reset_changes_attempt() {
        let mut s = session(MockSource::default(), MockExecutor::default());
        let before = s.snapshot().attempt_id;
        s.reset();
        assert_ne!(before, s.snapshot().attempt_id);
    }
}
