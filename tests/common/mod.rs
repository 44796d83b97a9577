//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

use upload_tracer::config::ServiceConfig;
use upload_tracer::http::HttpServer;
use upload_tracer::lifecycle::Shutdown;

pub const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
pub const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
pub const SPAN_ID: &str = "00f067aa0ba902b7";

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("upload-tracer-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Config bound to `addr` with a real payload file.
pub fn service_config(addr: SocketAddr) -> ServiceConfig {
    let payload = scratch_dir().join("picture.png");
    std::fs::write(&payload, b"\x89PNG integration payload").unwrap();

    let mut config = ServiceConfig::default();
    config.listener.bind_address = addr.to_string();
    config.storage.base_url = format!("http://{}/objects/", addr);
    config.producer.payload_path = payload.to_string_lossy().into_owned();
    config
}

/// Start the service; the returned handle stops it when triggered.
pub async fn spawn_service(config: ServiceConfig) -> Shutdown {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();

    tokio::spawn(async move {
        let _ = server.run(listener, handle).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

/// One batch received by the event sink.
#[derive(Debug, Clone)]
pub struct ReceivedBatch {
    pub access_key: Option<String>,
    pub body: Value,
}

pub type Received = Arc<Mutex<Vec<ReceivedBatch>>>;

/// Start a topic stand-in that records every batch posted to `/api/events`.
pub async fn start_event_sink(addr: SocketAddr) -> Received {
    let received: Received = Arc::default();

    async fn record(
        State(received): State<Received>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> &'static str {
        let access_key = headers
            .get("aeg-sas-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        received
            .lock()
            .expect("sink poisoned")
            .push(ReceivedBatch { access_key, body });
        ""
    }

    let app = Router::new()
        .route("/api/events", post(record))
        .with_state(received.clone());
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    received
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
