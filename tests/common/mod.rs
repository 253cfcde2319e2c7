//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use gameverse::config::{AppConfig, BreakerConfig};
use gameverse::http::{build_router, AppState};
use gameverse::resilience::{BoxError, FailureCategory, FlagEffects};
use gameverse::store::{Document, DocumentStore, MemoryDocumentStore, Selector, StoreError};

/// Which flag effect ran, and for which category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    On(FailureCategory),
    Off(FailureCategory),
}

/// `FlagEffects` fake that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingEffects {
    calls: Mutex<Vec<Effect>>,
    fail: AtomicBool,
}

impl RecordingEffects {
    pub fn failing() -> Self {
        let effects = Self::default();
        effects.fail.store(true, Ordering::SeqCst);
        effects
    }

    pub fn calls(&self) -> Vec<Effect> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, effect: Effect) -> Result<(), BoxError> {
        self.calls.lock().unwrap().push(effect);
        if self.fail.load(Ordering::SeqCst) {
            return Err("flag store unreachable".into());
        }
        Ok(())
    }
}

#[async_trait]
impl FlagEffects for RecordingEffects {
    async fn turn_on(&self, category: FailureCategory) -> Result<(), BoxError> {
        self.record(Effect::On(category))
    }

    async fn turn_off(&self, category: FailureCategory) -> Result<(), BoxError> {
        self.record(Effect::Off(category))
    }
}

pub type OpFuture = std::pin::Pin<Box<dyn Future<Output = Result<u32, BoxError>> + Send>>;

/// Operation that fails `failures` times, then returns the attempt number.
pub fn flaky_op(failures: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> OpFuture {
    move || -> OpFuture {
        let calls = calls.clone();
        Box::pin(async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= failures {
                Err(format!("attempt {n} failed").into())
            } else {
                Ok(n)
            }
        })
    }
}

/// Memory store that can be switched into an outage for selected databases.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    down: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicU32>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, db: &str, down: bool) {
        let mut dbs = self.down.lock().unwrap();
        dbs.retain(|d| d != db);
        if down {
            dbs.push(db.to_string());
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn memory(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    fn check(&self, db: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.lock().unwrap().iter().any(|d| d == db) {
            return Err(StoreError::Status { status: 503, body: "unavailable".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, db: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check(db)?;
        self.inner.get(db, id).await
    }

    async fn put(&self, db: &str, doc: Document) -> Result<Document, StoreError> {
        self.check(db)?;
        self.inner.put(db, doc).await
    }

    async fn delete(&self, db: &str, id: &str, rev: &str) -> Result<bool, StoreError> {
        self.check(db)?;
        self.inner.delete(db, id, rev).await
    }

    async fn find(&self, db: &str, selector: &Selector, limit: Option<usize>) -> Result<Vec<Document>, StoreError> {
        self.check(db)?;
        self.inner.find(db, selector, limit).await
    }
}

/// Default config with millisecond backoff and a short cooldown.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    let fast = BreakerConfig { cooldown_ms: 1_000, ..BreakerConfig::new(1, 2, 1) };
    config.breakers.game_api = fast.clone();
    config.breakers.user_store = fast.clone();
    config.breakers.comment_store = fast.clone();
    config.breakers.registry_store = fast;
    config.admin.api_key = "test-key".to_string();
    config.catalog.api_key = "catalog-key".to_string();
    config
}

/// Router and state over `store`, with the registry seeded.
pub async fn build_app(config: &AppConfig, store: Arc<dyn DocumentStore>) -> (Router, AppState) {
    let state = AppState::with_store(config, store).await.unwrap();
    let router = build_router(state.clone(), Duration::from_secs(config.timeouts.request_secs));
    (router, state)
}

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request_line = read_request_line(&mut socket).await;
                        let (status, body) = f(request_line).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
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
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

async fn read_request_line(socket: &mut tokio::net::TcpStream) -> String {
    use tokio::io::AsyncReadExt;

    let mut buf = vec![0u8; 8192];
    let mut read = 0;
    while read < buf.len() {
        match socket.read(&mut buf[read..]).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                read += n;
                if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf[..read]).lines().next().unwrap_or_default().to_string()
}

/// Send `request` through `router` and return status and JSON body.
pub async fn send(router: &Router, request: axum::http::Request<axum::body::Body>) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
    bearer: Option<&str>,
) -> axum::http::Request<axum::body::Body> {
    let mut builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(axum::body::Body::from(body.to_string())).unwrap()
}
