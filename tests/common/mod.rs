//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query exactly as sent.
    pub target: String,
    /// Header names lowercased.
    pub headers: Vec<(String, String)>,
}

#[allow(dead_code)]
impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a programmable mock backend that records every request.
///
/// `respond` maps each request to a status code and a JSON body.
#[allow(dead_code)]
pub async fn start_recording_backend<F>(respond: F) -> MockBackend
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let respond = respond.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_head(&mut socket).await else {
                            return;
                        };
                        let (status, body) = respond(&request);
                        recorded.lock().unwrap().push(request);

                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, requests }
}

/// Start a backend that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Handle to a running JSON-RPC node.
#[allow(dead_code)]
pub struct RpcNode {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

#[allow(dead_code)]
impl RpcNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Methods called so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Params of every call to `method`.
    pub fn params(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

/// Start a JSON-RPC node answering single requests.
///
/// `respond` maps `(method, params)` to a result, or to an error message
/// that is returned as a `-32000` JSON-RPC error.
#[allow(dead_code)]
pub async fn start_rpc_node<F>(respond: F) -> RpcNode
where
    F: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = calls.clone();
    let app = Router::new().route(
        "/",
        post(move |Json(request): Json<Value>| {
            let respond = respond.clone();
            let recorded = recorded.clone();
            async move {
                let id = request["id"].clone();
                let method = request["method"].as_str().unwrap_or_default().to_string();
                let params = request["params"].clone();
                let outcome = respond(&method, &params);
                recorded.lock().unwrap().push((method, params));

                Json(match outcome {
                    Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                    Err(message) => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": -32000, "message": message }
                    }),
                })
            }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    RpcNode { addr, calls }
}

/// A successful or reverted receipt as a node would return it.
#[allow(dead_code)]
pub fn receipt_json(tx_hash: &str, block_number: u64, success: bool) -> Value {
    json!({
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "11".repeat(32)),
        "blockNumber": format!("{:#x}", block_number),
        "from": TEST_ADDRESS,
        "to": format!("0x{}", "22".repeat(20)),
        "cumulativeGasUsed": "0x2bf20",
        "gasUsed": "0x2bf20",
        "effectiveGasPrice": "0x4a817c800",
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "type": "0x0",
        "status": if success { "0x1" } else { "0x0" }
    })
}

/// Read the request line and headers; bodies are ignored.
async fn read_head(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    Some(RecordedRequest {
        method,
        target,
        headers,
    })
}

/// Well-known Anvil development key (account 0).
#[allow(dead_code)]
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Address of [`TEST_PRIVATE_KEY`].
#[allow(dead_code)]
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Native-token sentinel used by the aggregator.
#[allow(dead_code)]
pub const ETH: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// USDC on Ethereum mainnet.
#[allow(dead_code)]
pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
