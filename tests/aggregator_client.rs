//! Aggregator client against a recording mock backend.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use reqwest::Method;
use serde_json::json;

use dex_swap::aggregator::{AggregatorClient, AggregatorError, QuoteRequest, SwapRequest};
use dex_swap::auth::signer::{
    ACCESS_KEY_HEADER, ACCESS_PASSPHRASE_HEADER, ACCESS_SIGN_HEADER, ACCESS_TIMESTAMP_HEADER,
};
use dex_swap::auth::RequestSigner;
use dex_swap::config::{AggregatorConfig, ApiCredentials};

mod common;
use common::{ETH, TEST_ADDRESS, USDC};

const BASE_PATH: &str = "/api/v5/dex/aggregator";

fn credentials() -> ApiCredentials {
    ApiCredentials {
        api_key: "test-api-key".into(),
        secret_key: "test-secret".into(),
        passphrase: "test-passphrase".into(),
    }
}

fn client_for(addr: std::net::SocketAddr, timeout_secs: u64) -> AggregatorClient {
    let config = AggregatorConfig {
        base_url: format!("http://{}{}", addr, BASE_PATH),
        request_timeout_secs: timeout_secs,
    };
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap();
    let signer = RequestSigner::new(&credentials()).unwrap();
    AggregatorClient::with_http_client(&config, signer, http).unwrap()
}

fn one_eth_to_usdc() -> QuoteRequest {
    QuoteRequest::new("1000000000000000000", ETH, USDC, 1).unwrap()
}

fn quote_body() -> String {
    json!({
        "code": "0",
        "msg": "",
        "data": [{
            "fromTokenAmount": "1000000000000000000",
            "toTokenAmount": "2512345678",
            "estimateGasFee": "135000",
            "fromToken": { "tokenContractAddress": ETH, "tokenSymbol": "ETH", "decimal": "18" },
            "toToken": { "tokenContractAddress": USDC, "tokenSymbol": "USDC", "decimal": "6" },
            "dexRouterList": [{ "router": "x" }]
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_quote_sends_signed_request() {
    let backend = common::start_recording_backend(|_| (200, quote_body())).await;
    let client = client_for(backend.addr, 5);

    let quote = client.quote(&one_eth_to_usdc()).await.unwrap();
    assert_eq!(quote.to_token_amount, "2512345678");
    assert_eq!(quote.to_token.unwrap().token_symbol, "USDC");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, "GET");
    let expected_target = format!(
        "{}/quote?amount=1000000000000000000&chainId=1&fromTokenAddress={}&toTokenAddress={}",
        BASE_PATH, ETH, USDC
    );
    assert_eq!(req.target, expected_target);

    assert_eq!(req.header(ACCESS_KEY_HEADER), Some("test-api-key"));
    assert_eq!(req.header(ACCESS_PASSPHRASE_HEADER), Some("test-passphrase"));
    assert_eq!(req.header("content-type"), Some("application/json"));

    // The signature covers the exact path that went over the wire
    let timestamp = req.header(ACCESS_TIMESTAMP_HEADER).unwrap();
    let signer = RequestSigner::new(&credentials()).unwrap();
    let expected = signer.sign(timestamp, &Method::GET, &expected_target);
    assert_eq!(req.header(ACCESS_SIGN_HEADER), Some(expected.as_str()));
}

#[tokio::test]
async fn test_empty_data_is_no_route() {
    let backend =
        common::start_recording_backend(|_| (200, r#"{"code":"0","msg":"","data":[]}"#.into())).await;
    let client = client_for(backend.addr, 5);

    let err = client.quote(&one_eth_to_usdc()).await.unwrap_err();
    assert!(matches!(err, AggregatorError::NoRoute(_)), "got {err:?}");
}

#[tokio::test]
async fn test_http_error_status() {
    let backend =
        common::start_recording_backend(|_| (503, r#"{"msg":"maintenance"}"#.into())).await;
    let client = client_for(backend.addr, 5);

    let err = client.quote(&one_eth_to_usdc()).await.unwrap_err();
    match err {
        AggregatorError::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("maintenance"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_code() {
    let backend = common::start_recording_backend(|_| {
        (200, r#"{"code":"50111","msg":"Invalid OK-ACCESS-KEY","data":[]}"#.into())
    })
    .await;
    let client = client_for(backend.addr, 5);

    let err = client.quote(&one_eth_to_usdc()).await.unwrap_err();
    match err {
        AggregatorError::Api { code, msg } => {
            assert_eq!(code, "50111");
            assert_eq!(msg, "Invalid OK-ACCESS-KEY");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn test_swap_returns_validated_payload() {
    let wallet: Address = TEST_ADDRESS.parse().unwrap();
    let body = json!({
        "code": "0",
        "msg": "",
        "data": [{
            "routerResult": {
                "fromTokenAmount": "1000000000000000000",
                "toTokenAmount": "2512345678"
            },
            "tx": {
                "from": TEST_ADDRESS,
                "to": "0x7D0CcAa3Fac1e5A943c5168b6CEd828691b46B36",
                "data": "0x0d5f0e3b00000000",
                "value": "1000000000000000000",
                "gas": "200000",
                "gasPrice": "20000000000",
                "minReceiveAmount": "2437000000"
            }
        }]
    })
    .to_string();
    let backend = common::start_recording_backend(move |_| (200, body.clone())).await;
    let client = client_for(backend.addr, 5);

    let request = SwapRequest::new(one_eth_to_usdc(), wallet, 0.03).unwrap();
    let payload = client.swap(&request).await.unwrap();

    assert_eq!(payload.gas_limit, 200_000);
    assert_eq!(payload.gas_price, 20_000_000_000);
    assert_eq!(payload.value, U256::from(1_000_000_000_000_000_000u64));
    assert_eq!(payload.min_receive_amount, Some(U256::from(2_437_000_000u64)));
    assert_eq!(payload.router_result.to_token_amount, "2512345678");

    let target = &backend.requests()[0].target;
    assert!(target.starts_with(&format!("{}/swap?amount=1000000000000000000&chainId=1&", BASE_PATH)));
    assert!(target.ends_with(&format!("&userWalletAddress={}&slippage=0.03", wallet)));
}

#[tokio::test]
async fn test_swap_with_malformed_tx() {
    let body = json!({
        "code": "0",
        "data": [{
            "routerResult": { "toTokenAmount": "1" },
            "tx": { "to": "not-an-address", "data": "0x", "gas": "21000", "gasPrice": "1" }
        }]
    })
    .to_string();
    let backend = common::start_recording_backend(move |_| (200, body.clone())).await;
    let client = client_for(backend.addr, 5);

    let request =
        SwapRequest::new(one_eth_to_usdc(), TEST_ADDRESS.parse().unwrap(), 0.03).unwrap();
    let err = client.swap(&request).await.unwrap_err();
    assert!(matches!(err, AggregatorError::MalformedPayload(_)), "got {err:?}");
}

#[tokio::test]
async fn test_request_timeout() {
    let addr = common::start_silent_backend().await;
    let client = client_for(addr, 1);

    let err = client.quote(&one_eth_to_usdc()).await.unwrap_err();
    assert!(matches!(err, AggregatorError::Timeout(1)), "got {err:?}");
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr, 2);
    let err = client.quote(&one_eth_to_usdc()).await.unwrap_err();
    assert!(matches!(err, AggregatorError::Request(_)), "got {err:?}");
}
