//! Request identification and inbound trace context.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) as early as possible
//! - Echo the request ID on the response
//! - Read the caller's `traceparent` for the producer routes

use axum::http::{HeaderMap, HeaderName};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::tracecontext::{parse_traceparent, TraceContext};

/// Request ID header name.
pub const X_REQUEST_ID: &str = "x-request-id";

/// W3C trace context request header.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Layer that stamps a fresh request ID on requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Request ID assigned by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Context for a producer invocation.
///
/// A valid inbound `traceparent` makes the producer a child of the caller's
/// span; anything else starts a new trace.
pub fn producer_context(headers: &HeaderMap) -> TraceContext {
    let Some(value) = headers.get(TRACEPARENT_HEADER) else {
        return TraceContext::new_root();
    };
    let parsed = value
        .to_str()
        .map_err(|e| e.to_string())
        .and_then(|v| parse_traceparent(v).map_err(|e| e.to_string()));
    match parsed {
        Ok(parent) => parent.child(),
        Err(error) => {
            tracing::warn!(error = %error, "Ignoring invalid inbound traceparent");
            TraceContext::new_root()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_fallback() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(request_id(&headers), "abc");
    }

    #[test]
    fn test_producer_context_continues_inbound_trace() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRACEPARENT_HEADER,
            HeaderValue::from_static("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
        );
        let ctx = producer_context(&headers);
        assert_eq!(ctx.trace_id.as_str(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_ne!(ctx.span_id.as_str(), "00f067aa0ba902b7");
    }

    #[test]
    fn test_producer_context_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT_HEADER, HeaderValue::from_static("00-short"));
        let first = producer_context(&headers);
        let second = producer_context(&headers);
        assert_ne!(first.trace_id, second.trace_id);
    }
}
