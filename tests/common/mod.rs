//! Local target server shared by the end-to-end tests

#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Latency of the `/slow` route
pub const SLOW_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone, Default)]
struct Hits(Arc<AtomicU64>);

/// A target server listening on an ephemeral local port
pub struct TargetServer {
    addr: SocketAddr,
    hits: Arc<AtomicU64>,
    handle: tokio::task::JoinHandle<()>,
}

impl TargetServer {
    pub async fn start() -> anyhow::Result<Self> {
        barrage_logging::init_simple_tracing("warn")?;

        let hits = Hits::default();
        let app = Router::new()
            .route("/health", get(health))
            .route("/missing", get(missing))
            .route("/slow", get(slow))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Target server stopped: {}", e);
            }
        });

        Ok(Self {
            addr,
            hits: hits.0,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requests the server has answered or started answering
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for TargetServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn health(State(hits): State<Hits>) -> Json<Value> {
    hits.0.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "status": "ok", "data": { "id": 7, "tags": ["a", "b"] } }))
}

async fn missing(State(hits): State<Hits>) -> (StatusCode, &'static str) {
    hits.0.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, "not found")
}

async fn slow(State(hits): State<Hits>) -> &'static str {
    hits.0.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(SLOW_DELAY).await;
    "done"
}

/// A local address nothing listens on
pub async fn closed_port_url() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}
