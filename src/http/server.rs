//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared application state from config
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, timeouts, request ID)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{any, get},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::{ServiceConfig, StorageBackend};
use crate::consumer::{CloudEventsConsumer, NativeEventConsumer};
use crate::events::{EventPublisher, HttpEventPublisher, PublishError};
use crate::http::handlers::{
    cloud_events, health, storage_events, upload, upload_custom, CLOUD_EVENTS_ROUTE, HEALTH_ROUTE,
    STORAGE_EVENTS_ROUTE, UPLOAD_CUSTOM_ROUTE, UPLOAD_ROUTE,
};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::producer::{PayloadSource, ProducerCorrelator};
use crate::storage::{
    FilesystemObjectStore, MemoryObjectStore, ObjectLocator, ObjectStore, StorageError,
};

/// Failure while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid publish endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error(transparent)]
    Publisher(#[from] PublishError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub producer: Arc<ProducerCorrelator>,
    pub payload: PayloadSource,
    pub native: Arc<NativeEventConsumer>,
    pub cloud: Arc<CloudEventsConsumer>,
}

impl AppState {
    /// Wire producer and consumers around an existing store and publisher.
    pub fn new(
        config: &ServiceConfig,
        store: Arc<dyn ObjectStore>,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Self {
        let mut producer = ProducerCorrelator::new(store.clone())
            .with_event_type(config.producer.custom_event_type.as_str())
            .with_event_subject(config.producer.event_subject.as_str());
        if let Some(publisher) = publisher {
            producer = producer.with_publisher(publisher);
        }

        let native = NativeEventConsumer::new(store)
            .with_custom_event_type(config.producer.custom_event_type.as_str());
        let cloud = CloudEventsConsumer::new(
            config.webhook.handshake.clone(),
            config.webhook.allowed_origin.as_str(),
        );

        Self {
            producer: Arc::new(producer),
            payload: PayloadSource::new(&config.producer.payload_path),
            native: Arc::new(native),
            cloud: Arc::new(cloud),
        }
    }

    /// Build the configured store and publisher, then wire everything.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServerError> {
        let locator = ObjectLocator::new(&config.storage.base_url, &config.storage.container)?;
        let store: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryObjectStore::new(locator)),
            StorageBackend::Filesystem => Arc::new(FilesystemObjectStore::new(
                &config.storage.root,
                &config.storage.container,
                locator,
            )),
        };

        let publisher = match &config.producer.publish_endpoint {
            Some(endpoint) => {
                let publisher = HttpEventPublisher::new(
                    Url::parse(endpoint)?,
                    config.producer.access_key.as_str(),
                    Duration::from_secs(config.producer.publish_timeout_secs),
                )?;
                tracing::info!(endpoint = %publisher.endpoint(), "Custom event publishing enabled");
                Some(Arc::new(publisher) as Arc<dyn EventPublisher>)
            }
            None => None,
        };

        tracing::info!(
            store = store.name(),
            container = %config.storage.container,
            "Object store ready"
        );
        Ok(Self::new(config, store, publisher))
    }
}

/// HTTP server hosting the producer and consumer routes.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server whose state is built from `config`.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around prepared state.
    pub fn with_state(config: ServiceConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route(UPLOAD_ROUTE, get(upload).post(upload))
            .route(UPLOAD_CUSTOM_ROUTE, get(upload_custom).post(upload_custom))
            .route(STORAGE_EVENTS_ROUTE, axum::routing::post(storage_events))
            .route(CLOUD_EVENTS_ROUTE, any(cloud_events))
            .route(HEALTH_ROUTE, get(health))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Router with state applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::consumer::ALLOWED_ORIGIN_HEADER;
    use crate::events::{BlobCreatedData, StorageEvent, BLOB_CREATED, SUBSCRIPTION_VALIDATION};
    use crate::http::request::X_REQUEST_ID;

    const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn payload_file() -> String {
        let path = std::env::temp_dir().join(format!("upload-tracer-{}.png", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"\x89PNG fake").unwrap();
        path.to_string_lossy().into_owned()
    }

    fn test_router() -> Router {
        let mut config = ServiceConfig::default();
        config.producer.payload_path = payload_file();
        let state = AppState::from_config(&config).unwrap();
        HttpServer::with_state(config, state).router()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_has_request_id() {
        let router = test_router();
        let (status, headers, body) = send(
            &router,
            Request::get(HEALTH_ROUTE).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(headers.contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_upload_then_native_event_links() {
        let router = test_router();
        let (status, _, receipt) = send(
            &router,
            Request::get(UPLOAD_ROUTE).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["mode"], "metadata");

        let url = receipt["object_url"].as_str().unwrap().parse().unwrap();
        let event = StorageEvent::new(
            "/blobServices/default/containers/uploads",
            BLOB_CREATED,
            "",
            serde_json::to_value(BlobCreatedData::block_upload(url)).unwrap(),
        );
        let (status, _, body) = send(
            &router,
            post_json(STORAGE_EVENTS_ROUTE, serde_json::to_string(&[event]).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["outcome"], "linked");
        assert_eq!(body["events"][0]["link"]["operation_Id"], receipt["trace_id"]);
        assert_eq!(body["events"][0]["link"]["id"], receipt["span_id"]);
    }

    #[tokio::test]
    async fn test_upload_continues_inbound_trace() {
        let router = test_router();
        let request = Request::post(UPLOAD_ROUTE)
            .header("traceparent", TRACEPARENT)
            .body(Body::empty())
            .unwrap();
        let (status, _, receipt) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["trace_id"], "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_ne!(receipt["span_id"], "00f067aa0ba902b7");
    }

    #[tokio::test]
    async fn test_custom_upload_without_publisher() {
        let router = test_router();
        let (status, _, body) = send(
            &router,
            Request::get(UPLOAD_CUSTOM_ROUTE).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_object_is_server_error() {
        let router = test_router();
        let url = "http://127.0.0.1:8080/objects/uploads/missing.png".parse().unwrap();
        let event = StorageEvent::new(
            "/x",
            BLOB_CREATED,
            "",
            serde_json::to_value(BlobCreatedData::block_upload(url)).unwrap(),
        );
        let (status, _, _) = send(
            &router,
            post_json(STORAGE_EVENTS_ROUTE, serde_json::to_string(&[event]).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_storage_events_validation_and_garbage() {
        let router = test_router();
        let event = StorageEvent::new(
            "",
            SUBSCRIPTION_VALIDATION,
            "",
            serde_json::json!({ "validationCode": "512d38b6" }),
        );
        let (status, _, body) = send(
            &router,
            post_json(STORAGE_EVENTS_ROUTE, serde_json::to_string(&[event]).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["validationResponse"], "512d38b6");

        let (status, _, _) = send(&router, post_json(STORAGE_EVENTS_ROUTE, "{".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cloud_handshake() {
        let router = test_router();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(CLOUD_EVENTS_ROUTE)
            .header("WebHook-Request-Origin", "eventgrid.azure.net")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[ALLOWED_ORIGIN_HEADER], "eventgrid.azure.net");
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_cloud_delivery() {
        let router = test_router();
        let linked = serde_json::json!({
            "specversion": "1.0",
            "id": "evt-1",
            "source": "/blobServices/default",
            "type": "Microsoft.Storage.BlobCreated",
            "traceparent": TRACEPARENT,
        });
        let (status, _, body) = send(&router, post_json(CLOUD_EVENTS_ROUTE, linked.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["outcome"], "linked");
        assert_eq!(
            body["events"][0]["link"]["operation_Id"],
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );
        assert_eq!(body["events"][0]["link"]["id"], "00f067aa0ba902b7");

        let plain = serde_json::json!({
            "specversion": "1.0",
            "id": "evt-2",
            "source": "/blobServices/default",
            "type": "Microsoft.Storage.BlobCreated",
        });
        let (status, _, body) = send(&router, post_json(CLOUD_EVENTS_ROUTE, plain.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["outcome"], "not_present");

        let (status, _, _) = send(&router, post_json(CLOUD_EVENTS_ROUTE, "garbage".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
