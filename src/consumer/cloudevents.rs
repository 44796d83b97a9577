//! Consumer behind the CloudEvents webhook.
//!
//! # Responsibilities
//! - Classify each request as handshake or delivery
//! - Answer handshakes with the allowed origin, without reading the body
//! - Link a fresh span per delivered event via its `traceparent` attribute

use axum::http::{HeaderMap, Method};
use serde::Serialize;
use tracing::Instrument;

use crate::config::HandshakeRule;
use crate::consumer::linker::{attach_link, LinkOutcome};
use crate::consumer::source::CloudEventSource;
use crate::consumer::span::{consumer_span, SpanTags};
use crate::consumer::ConsumerError;
use crate::events::CloudEvent;

/// Response header asserting which origin may deliver events.
pub const ALLOWED_ORIGIN_HEADER: &str = "Webhook-Allowed-Origin";

const FUNCTION_NAME: &str = "UploadProcessorHttp";

/// How a webhook request is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Handshake,
    Delivery,
}

/// Per-event outcome of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub id: String,
    #[serde(flatten)]
    pub outcome: LinkOutcome,
}

pub struct CloudEventsConsumer {
    rule: HandshakeRule,
    allowed_origin: String,
}

impl CloudEventsConsumer {
    pub fn new(rule: HandshakeRule, allowed_origin: impl Into<String>) -> Self {
        Self {
            rule,
            allowed_origin: allowed_origin.into(),
        }
    }

    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    /// Decide handshake vs delivery for one request.
    ///
    /// A request with a body or with binary-mode event headers is always a
    /// delivery; the rule only decides among the rest.
    pub fn classify(&self, method: &Method, headers: &HeaderMap, body: &[u8]) -> RequestKind {
        if !body.is_empty() || CloudEvent::is_binary(headers) {
            return RequestKind::Delivery;
        }
        let matches = match &self.rule {
            HandshakeRule::Method { method: expected } => {
                method.as_str().eq_ignore_ascii_case(expected)
            }
            HandshakeRule::Header { name } => {
                headers.contains_key(name.to_ascii_lowercase().as_str())
            }
        };
        if matches {
            RequestKind::Handshake
        } else {
            RequestKind::Delivery
        }
    }

    /// Link `span` to the producer context carried by `event`.
    pub async fn on_delivered(
        &self,
        event: &CloudEvent,
        span: &dyn SpanTags,
    ) -> Result<LinkOutcome, ConsumerError> {
        tracing::info!(event_type = %event.event_type, source = %event.source, "Processing...");
        let outcome = attach_link(&CloudEventSource::new(event), span).await?;
        tracing::info!(outcome = outcome.as_str(), "Done.");
        Ok(outcome)
    }

    /// Decode a delivery body and link every event in it.
    pub async fn handle_delivery(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Vec<DeliveryReport>, ConsumerError> {
        let events = CloudEvent::from_http(headers, body)?;
        let mut reports = Vec::with_capacity(events.len());
        for event in &events {
            let span = consumer_span(FUNCTION_NAME, &event.id);
            let outcome = self
                .on_delivered(event, &span)
                .instrument(span.clone())
                .await?;
            reports.push(DeliveryReport {
                id: event.id.clone(),
                outcome,
            });
        }
        Ok(reports)
    }
}
