//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use analytics_proxy::config::ProxyConfig;
use analytics_proxy::http::HttpServer;
use analytics_proxy::lifecycle::Shutdown;
use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A running mock upstream and everything it has received.
pub struct MockUpstream {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.received.lock().unwrap().clone()
    }
}

type ResponseFuture = Pin<Box<dyn Future<Output = (u16, Vec<u8>)> + Send>>;
type Responder = Arc<dyn Fn(RecordedRequest) -> ResponseFuture + Send + Sync>;

#[derive(Clone)]
struct MockState {
    received: Arc<Mutex<Vec<RecordedRequest>>>,
    respond: Responder,
}

async fn mock_handler(State(state): State<MockState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let recorded = RecordedRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
    };
    state.received.lock().unwrap().push(recorded.clone());

    let (status, body) = (state.respond)(recorded).await;
    (
        StatusCode::from_u16(status).unwrap(),
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::SET_COOKIE, "upstream=1"),
        ],
        body,
    )
        .into_response()
}

/// Start a programmable mock upstream with async support.
#[allow(dead_code)]
pub async fn start_programmable_upstream<F, Fut>(f: F) -> MockUpstream
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<u8>)> + Send + 'static,
{
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        received: received.clone(),
        respond: Arc::new(move |req| -> ResponseFuture { Box::pin(f(req)) }),
    };
    let app = Router::new().fallback(mock_handler).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, received }
}

/// Start a mock upstream that always answers with `status` and `body`.
#[allow(dead_code)]
pub async fn start_mock_upstream(status: u16, body: &'static [u8]) -> MockUpstream {
    start_programmable_upstream(move |_| async move { (status, body.to_vec()) }).await
}

/// Start an upstream that sends its status line and headers at once, then
/// writes `chunks` one by one with `delay` between them.
///
/// Speaks raw HTTP/1.1 so the pacing is under the test's control.
#[allow(dead_code)]
pub async fn start_trickling_upstream(chunks: Vec<&'static [u8]>, delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let chunks = chunks.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let length: usize = chunks.iter().map(|c| c.len()).sum();
                let head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: text/javascript\r\ncontent-length: {}\r\n\r\n",
                    length
                );
                if stream.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for chunk in chunks {
                    tokio::time::sleep(delay).await;
                    if stream.write_all(chunk).await.is_err() {
                        return;
                    }
                }
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Proxy config pointed at `upstream`, listening on an ephemeral port.
#[allow(dead_code)]
pub fn proxy_config(upstream: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = upstream.to_string();
    config
}

/// Start the proxy; returns its address and the shutdown handle.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Test client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
