//! Aggregator request/response types and error definitions.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur while talking to the swap aggregator.
#[derive(Debug, Clone, Error)]
pub enum AggregatorError {
    /// Caller input rejected before any request was made.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Connection or transport failure.
    #[error("Request failed: {0}")]
    Request(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Non-2xx HTTP response.
    #[error("Aggregator returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 2xx response carrying a non-zero application code.
    #[error("Aggregator error {code}: {msg}")]
    Api { code: String, msg: String },

    /// Response body did not match the expected envelope.
    #[error("Undecodable aggregator response: {0}")]
    Decode(String),

    /// The aggregator returned an empty result list.
    #[error("No route found for {0}")]
    NoRoute(String),

    /// The swap transaction object failed validation; nothing was signed.
    #[error("Malformed swap payload: {0}")]
    MalformedPayload(String),

    /// Request headers could not be built.
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl From<AuthError> for AggregatorError {
    fn from(e: AuthError) -> Self {
        AggregatorError::Auth(e.to_string())
    }
}

/// Result type for aggregator operations.
pub type AggregatorResult<T> = Result<T, AggregatorError>;

/// Parse an amount in the token's smallest unit.
///
/// Accepts only a positive base-10 integer without sign, separators or
/// leading zeros.
pub fn parse_amount(amount: &str) -> AggregatorResult<U256> {
    let invalid = || AggregatorError::Validation(format!("amount '{}' is not a positive integer", amount));

    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if amount.starts_with('0') {
        return Err(invalid());
    }
    U256::from_str_radix(amount, 10).map_err(|_| invalid())
}

/// Parse a 20-byte hex address.
pub fn parse_address(field: &str, value: &str) -> AggregatorResult<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| AggregatorError::Validation(format!("{} '{}' is not a valid address", field, value)))
}

/// Parameters for a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub amount: U256,
    pub from_token_address: Address,
    pub to_token_address: Address,
    pub chain_id: u64,
}

impl QuoteRequest {
    /// Validate raw inputs into a request.
    pub fn new(amount: &str, from_token: &str, to_token: &str, chain_id: u64) -> AggregatorResult<Self> {
        if chain_id == 0 {
            return Err(AggregatorError::Validation("chain id must be > 0".to_string()));
        }
        Ok(Self {
            amount: parse_amount(amount)?,
            from_token_address: parse_address("fromTokenAddress", from_token)?,
            to_token_address: parse_address("toTokenAddress", to_token)?,
            chain_id,
        })
    }

    fn query(&self) -> String {
        format!(
            "amount={}&chainId={}&fromTokenAddress={}&toTokenAddress={}",
            self.amount, self.chain_id, self.from_token_address, self.to_token_address
        )
    }

    /// Path and query relative to the aggregator base URL.
    pub fn path(&self) -> String {
        format!("/quote?{}", self.query())
    }

    /// Short human-readable description for errors and logs.
    pub fn describe(&self) -> String {
        format!(
            "{} of {} -> {} on chain {}",
            self.amount, self.from_token_address, self.to_token_address, self.chain_id
        )
    }
}

/// Parameters for a swap payload: a quote plus the signer and slippage.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub quote: QuoteRequest,
    pub user_wallet_address: Address,
    /// Fraction in (0, 1).
    pub slippage: f64,
}

impl SwapRequest {
    pub fn new(quote: QuoteRequest, user_wallet_address: Address, slippage: f64) -> AggregatorResult<Self> {
        if !(slippage > 0.0 && slippage < 1.0) {
            return Err(AggregatorError::Validation(format!(
                "slippage {} must be between 0 and 1 (exclusive)",
                slippage
            )));
        }
        Ok(Self {
            quote,
            user_wallet_address,
            slippage,
        })
    }

    /// Path and query relative to the aggregator base URL.
    pub fn path(&self) -> String {
        format!(
            "/swap?{}&userWalletAddress={}&slippage={}",
            self.quote.query(),
            self.user_wallet_address,
            self.slippage
        )
    }
}

/// Response envelope shared by every aggregator endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub code: serde_json::Value,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl ApiResponse {
    /// The API signals success with code `"0"` (string or number).
    pub fn is_success(&self) -> bool {
        match &self.code {
            serde_json::Value::String(s) => s == "0",
            serde_json::Value::Number(n) => n.as_i64() == Some(0),
            serde_json::Value::Null => true,
            _ => false,
        }
    }

    pub fn code_string(&self) -> String {
        match &self.code {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Token metadata attached to quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(default)]
    pub token_contract_address: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub decimal: Option<String>,
}

/// Estimate returned by the quote endpoint. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    #[serde(default)]
    pub from_token_amount: String,
    pub to_token_amount: String,
    #[serde(default)]
    pub estimate_gas_fee: Option<String>,
    #[serde(default)]
    pub price_impact_percentage: Option<String>,
    #[serde(default)]
    pub from_token: Option<TokenInfo>,
    #[serde(default)]
    pub to_token: Option<TokenInfo>,
    #[serde(default)]
    pub dex_router_list: Vec<serde_json::Value>,
}

/// Raw transaction object inside a swap response, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSwapTx {
    #[serde(default)]
    pub from: String,
    pub to: String,
    pub data: String,
    #[serde(default)]
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    #[serde(default)]
    pub min_receive_amount: Option<String>,
}

/// Raw element of the swap endpoint's `data` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSwapData {
    pub router_result: QuoteResult,
    pub tx: RawSwapTx,
}

/// A validated, ready-to-sign swap transaction.
///
/// Not `Clone`: a payload authorizes exactly one swap and is consumed by
/// submission.
#[derive(Debug, PartialEq)]
pub struct SwapPayload {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub min_receive_amount: Option<U256>,
    pub router_result: QuoteResult,
}

impl SwapPayload {
    /// Validate the aggregator's raw transaction for `wallet`.
    pub fn from_raw(raw: RawSwapData, wallet: Address) -> AggregatorResult<Self> {
        let tx = raw.tx;
        let malformed = |field: &str, value: &str| {
            AggregatorError::MalformedPayload(format!("{} '{}' is invalid", field, value))
        };

        if !tx.from.is_empty() {
            let from: Address = tx.from.parse().map_err(|_| malformed("tx.from", &tx.from))?;
            if from != wallet {
                return Err(AggregatorError::MalformedPayload(format!(
                    "payload built for {} but wallet is {}",
                    from, wallet
                )));
            }
        }

        let to: Address = tx.to.parse().map_err(|_| malformed("tx.to", &tx.to))?;
        let data: Bytes = tx.data.parse().map_err(|_| malformed("tx.data", &tx.data))?;
        let value = if tx.value.is_empty() {
            U256::ZERO
        } else {
            parse_quantity(&tx.value).ok_or_else(|| malformed("tx.value", &tx.value))?
        };
        let gas_limit = parse_quantity(&tx.gas)
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| malformed("tx.gas", &tx.gas))?;
        let gas_price = parse_quantity(&tx.gas_price)
            .and_then(|v| u128::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| malformed("tx.gasPrice", &tx.gas_price))?;
        let min_receive_amount = match tx.min_receive_amount.as_deref() {
            None | Some("") => None,
            Some(s) => Some(parse_quantity(s).ok_or_else(|| malformed("tx.minReceiveAmount", s))?),
        };

        Ok(Self {
            to,
            data,
            value,
            gas_limit,
            gas_price,
            min_receive_amount,
            router_result: raw.router_result,
        })
    }

    /// Serializable view for display; the payload itself stays single-use.
    pub fn summary(&self) -> PayloadSummary {
        PayloadSummary {
            to: self.to,
            value: self.value.to_string(),
            gas_limit: self.gas_limit,
            gas_price: self.gas_price.to_string(),
            data_len: self.data.len(),
            min_receive_amount: self.min_receive_amount.map(|v| v.to_string()),
            to_token_amount: self.router_result.to_token_amount.clone(),
        }
    }
}

/// Display-only summary of a prepared swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadSummary {
    pub to: Address,
    pub value: String,
    pub gas_limit: u64,
    pub gas_price: String,
    pub data_len: usize,
    pub min_receive_amount: Option<String>,
    pub to_token_amount: String,
}

/// Decimal or `0x`-prefixed hex quantity.
fn parse_quantity(s: &str) -> Option<U256> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => U256::from_str_radix(s, 10).ok(),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{NATIVE_TOKEN_ADDRESS, USDC_MAINNET_ADDRESS};

    const WALLET: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn eth_to_usdc() -> QuoteRequest {
        QuoteRequest::new("1000000000000000000", NATIVE_TOKEN_ADDRESS, USDC_MAINNET_ADDRESS, 1).unwrap()
    }

    fn raw_swap(tx: serde_json::Value) -> RawSwapData {
        serde_json::from_value(serde_json::json!({
            "routerResult": { "fromTokenAmount": "1000", "toTokenAmount": "2500" },
            "tx": tx,
        }))
        .unwrap()
    }

    #[test]
    fn test_quote_path_scenario() {
        assert_eq!(
            eth_to_usdc().path(),
            format!(
                "/quote?amount=1000000000000000000&chainId=1&fromTokenAddress={}&toTokenAddress={}",
                NATIVE_TOKEN_ADDRESS, USDC_MAINNET_ADDRESS
            )
        );
    }

    #[test]
    fn test_quote_path_is_deterministic() {
        let a = eth_to_usdc();
        let other = QuoteRequest::new("5", USDC_MAINNET_ADDRESS, NATIVE_TOKEN_ADDRESS, 10).unwrap();
        let first = a.path();
        let _ = other.path();
        assert_eq!(first, eth_to_usdc().path());
    }

    #[test]
    fn test_address_case_normalized() {
        let lower = QuoteRequest::new("1", &NATIVE_TOKEN_ADDRESS.to_lowercase(), USDC_MAINNET_ADDRESS, 1).unwrap();
        assert_eq!(lower.path(), QuoteRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC_MAINNET_ADDRESS, 1).unwrap().path());
    }

    #[test]
    fn test_swap_path() {
        let req = SwapRequest::new(eth_to_usdc(), WALLET.parse().unwrap(), 0.03).unwrap();
        assert_eq!(
            req.path(),
            format!(
                "/swap?amount=1000000000000000000&chainId=1&fromTokenAddress={}&toTokenAddress={}&userWalletAddress={}&slippage=0.03",
                NATIVE_TOKEN_ADDRESS, USDC_MAINNET_ADDRESS, WALLET
            )
        );
    }

    #[test]
    fn test_amount_validation() {
        assert!(parse_amount("1").is_ok());
        for bad in ["", "0", "007", "-1", "1.5", "1e18", " 1", "abc"] {
            assert!(
                matches!(parse_amount(bad), Err(AggregatorError::Validation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_bad_inputs_rejected() {
        assert!(QuoteRequest::new("1", "0x1234", USDC_MAINNET_ADDRESS, 1).is_err());
        assert!(QuoteRequest::new("1", NATIVE_TOKEN_ADDRESS, USDC_MAINNET_ADDRESS, 0).is_err());
        assert!(SwapRequest::new(eth_to_usdc(), Address::ZERO, 0.0).is_err());
        assert!(SwapRequest::new(eth_to_usdc(), Address::ZERO, 1.0).is_err());
    }

    #[test]
    fn test_envelope_codes() {
        let ok: ApiResponse = serde_json::from_str(r#"{"code":"0","msg":"","data":[]}"#).unwrap();
        assert!(ok.is_success());
        let numeric: ApiResponse = serde_json::from_str(r#"{"code":0,"data":[]}"#).unwrap();
        assert!(numeric.is_success());
        let err: ApiResponse = serde_json::from_str(r#"{"code":"51000","msg":"bad param"}"#).unwrap();
        assert!(!err.is_success());
        assert_eq!(err.code_string(), "51000");
    }

    #[test]
    fn test_payload_from_raw() {
        let payload = SwapPayload::from_raw(
            raw_swap(serde_json::json!({
                "from": WALLET.to_lowercase(),
                "to": "0x1111111254eeb25477b68fb85ed929f73a960582",
                "data": "0xdeadbeef",
                "value": "1000000000000000000",
                "gas": "200000",
                "gasPrice": "0x3b9aca00",
                "minReceiveAmount": "2400"
            })),
            WALLET.parse().unwrap(),
        )
        .unwrap();

        assert_eq!(payload.data.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(payload.value, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(payload.gas_limit, 200_000);
        assert_eq!(payload.gas_price, 1_000_000_000);
        assert_eq!(payload.min_receive_amount, Some(U256::from(2400)));
        assert_eq!(payload.summary().to_token_amount, "2500");
    }

    #[test]
    fn test_payload_rejects_malformed_fields() {
        let wallet: Address = WALLET.parse().unwrap();
        let base = serde_json::json!({
            "to": "0x1111111254eeb25477b68fb85ed929f73a960582",
            "data": "0x",
            "value": "0",
            "gas": "21000",
            "gasPrice": "1"
        });

        for (field, bad) in [("to", "nope"), ("data", "0xzz"), ("gas", "-5"), ("gasPrice", "0"), ("value", "1.5")] {
            let mut tx = base.clone();
            tx[field] = serde_json::json!(bad);
            let err = SwapPayload::from_raw(raw_swap(tx), wallet).unwrap_err();
            assert!(matches!(err, AggregatorError::MalformedPayload(_)), "{field}: {err}");
        }
    }

    #[test]
    fn test_payload_rejects_foreign_wallet() {
        let tx = serde_json::json!({
            "from": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "to": "0x1111111254eeb25477b68fb85ed929f73a960582",
            "data": "0x",
            "gas": "21000",
            "gasPrice": "1"
        });
        let err = SwapPayload::from_raw(raw_swap(tx), WALLET.parse().unwrap()).unwrap_err();
        assert!(err.to_string().contains("payload built for"));
    }
}
