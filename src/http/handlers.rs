//! Route handlers.
//!
//! Each handler adapts one HTTP route to a producer or consumer operation
//! and maps library errors onto status codes. Nothing below this layer knows
//! about HTTP status.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::consumer::{ConsumerError, RequestKind, ALLOWED_ORIGIN_HEADER};
use crate::events::StorageEvent;
use crate::http::request::{producer_context, request_id};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::producer::{ProducerError, UploadMode, UploadReceipt};
use crate::tracecontext::format_traceparent;

pub const UPLOAD_ROUTE: &str = "/api/upload";
pub const UPLOAD_CUSTOM_ROUTE: &str = "/api/upload-custom";
pub const STORAGE_EVENTS_ROUTE: &str = "/api/events/storage";
pub const CLOUD_EVENTS_ROUTE: &str = "/api/events/cloud";
pub const HEALTH_ROUTE: &str = "/health";

/// Body returned by the producer routes.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub object_url: String,
    pub trace_id: String,
    pub span_id: String,
    pub traceparent: String,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl From<&UploadReceipt> for UploadResponse {
    fn from(receipt: &UploadReceipt) -> Self {
        Self {
            object_url: receipt.object.url().to_string(),
            trace_id: receipt.trace.trace_id.to_string(),
            span_id: receipt.trace.span_id.to_string(),
            traceparent: format_traceparent(&receipt.trace, true),
            mode: receipt.mode.as_str(),
            event_id: receipt.event_id.clone(),
        }
    }
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

fn finish(route: &'static str, start: Instant, response: Response) -> Response {
    metrics::record_request(route, response.status().as_u16(), start);
    response
}

/// Producer, metadata mode.
pub async fn upload(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let response = run_upload(&state, &headers, UploadMode::Metadata).await;
    finish(UPLOAD_ROUTE, start, response)
}

/// Producer, custom-event mode.
pub async fn upload_custom(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let response = run_upload(&state, &headers, UploadMode::CustomEvent).await;
    finish(UPLOAD_CUSTOM_ROUTE, start, response)
}

async fn run_upload(state: &AppState, headers: &HeaderMap, mode: UploadMode) -> Response {
    let request_id = request_id(headers);
    if mode == UploadMode::CustomEvent && !state.producer.has_publisher() {
        tracing::warn!(request_id = %request_id, "Custom upload requested without a publish endpoint");
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ProducerError::PublisherNotConfigured,
        );
    }

    let content = match state.payload.read().await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                path = %state.payload.path().display(),
                error = %e,
                "Failed to read payload"
            );
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "payload unavailable");
        }
    };

    let ctx = producer_context(headers);
    let name = state.payload.object_name();
    tracing::info!(
        request_id = %request_id,
        object = %name,
        trace_id = %ctx.trace_id,
        mode = mode.as_str(),
        "Upload triggered"
    );

    match state.producer.upload(&ctx, &name, content, mode).await {
        Ok(receipt) => (StatusCode::OK, Json(UploadResponse::from(&receipt))).into_response(),
        Err(ProducerError::PublisherNotConfigured) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ProducerError::PublisherNotConfigured,
        ),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upload failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// Native storage notifications in the event-grid schema.
pub async fn storage_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let events: Vec<StorageEvent> = match serde_json::from_slice(&body) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejecting unparseable event batch");
            return finish(
                STORAGE_EVENTS_ROUTE,
                start,
                error_response(StatusCode::BAD_REQUEST, e),
            );
        }
    };

    let response = match state.native.handle_batch(&events).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => consumer_error_response(request_id, e),
    };
    finish(STORAGE_EVENTS_ROUTE, start, response)
}

/// CloudEvents webhook: handshake and delivery share one route.
pub async fn cloud_events(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let response = match state.cloud.classify(&method, &headers, &body) {
        RequestKind::Handshake => {
            tracing::info!(request_id = %request_id, method = %method, "Answering webhook handshake");
            match HeaderValue::from_str(state.cloud.allowed_origin()) {
                Ok(origin) => {
                    metrics::record_handshake();
                    (StatusCode::OK, [(ALLOWED_ORIGIN_HEADER, origin)]).into_response()
                }
                Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
            }
        }
        RequestKind::Delivery => match state.cloud.handle_delivery(&headers, &body).await {
            Ok(reports) => (StatusCode::OK, Json(json!({ "events": reports }))).into_response(),
            Err(e) => consumer_error_response(request_id, e),
        },
    };
    finish(CLOUD_EVENTS_ROUTE, start, response)
}

fn consumer_error_response(request_id: &str, error: ConsumerError) -> Response {
    match error {
        ConsumerError::Storage(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Metadata read failed, requesting redelivery");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
        e => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejecting undecodable delivery");
            error_response(StatusCode::BAD_REQUEST, e)
        }
    }
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
