//! CloudEvents 1.0 envelopes over HTTP.
//!
//! # Responsibilities
//! - Parse structured (`application/cloudevents+json`) deliveries
//! - Parse batch (`application/cloudevents-batch+json`) deliveries
//! - Parse binary deliveries, where attributes travel as `ce-*` headers
//! - Expose extension attributes such as `traceparent` as strings

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Extension attribute carrying the W3C traceparent.
pub const TRACEPARENT_ATTRIBUTE: &str = "traceparent";

pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";
pub const BATCH_CONTENT_TYPE: &str = "application/cloudevents-batch+json";

const BINARY_HEADER_PREFIX: &str = "ce-";
const BINARY_SPECVERSION_HEADER: &str = "ce-specversion";

#[derive(Debug, Error)]
pub enum CloudEventError {
    #[error("invalid CloudEvents JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary-mode event is missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("header '{0}' is not valid UTF-8")]
    InvalidHeader(String),
}

/// A CloudEvents envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub specversion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// Every attribute not named above.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl CloudEvent {
    /// A 1.0 event with no data or extensions.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            event_type: event_type.into(),
            specversion: "1.0".to_string(),
            subject: None,
            time: None,
            datacontenttype: None,
            dataschema: None,
            data: None,
            data_base64: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// String value of an extension attribute. Non-string values are ignored.
    pub fn extension(&self, name: &str) -> Option<&str> {
        self.extensions.get(name).and_then(Value::as_str)
    }

    /// Parse a structured-mode body.
    pub fn from_structured(body: &[u8]) -> Result<Self, CloudEventError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Parse a batch-mode body.
    pub fn from_batch(body: &[u8]) -> Result<Vec<Self>, CloudEventError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Assemble a binary-mode event from `ce-*` headers and the raw body.
    pub fn from_binary(headers: &HeaderMap, body: &[u8]) -> Result<Self, CloudEventError> {
        let mut attributes = BTreeMap::new();
        for (name, value) in headers {
            if let Some(attr) = name.as_str().strip_prefix(BINARY_HEADER_PREFIX) {
                let value = value
                    .to_str()
                    .map_err(|_| CloudEventError::InvalidHeader(name.to_string()))?;
                attributes.insert(attr.to_string(), value.to_string());
            }
        }

        let mut take = |key: &'static str| {
            attributes
                .remove(key)
                .ok_or(CloudEventError::MissingAttribute(key))
        };
        let mut event = CloudEvent::new(take("id")?, take("source")?, take("type")?);
        event.specversion = take("specversion")?;
        event.subject = attributes.remove("subject");
        event.time = attributes.remove("time");
        event.dataschema = attributes.remove("dataschema");
        event.datacontenttype = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !body.is_empty() {
            event.data = Some(
                serde_json::from_slice(body).unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(body).into_owned())
                }),
            );
        }

        event.extensions = attributes
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Ok(event)
    }

    /// Whether `headers` carry a binary-mode event, which may have no body.
    pub fn is_binary(headers: &HeaderMap) -> bool {
        headers.contains_key(BINARY_SPECVERSION_HEADER)
    }

    /// Decode a webhook delivery in whichever content mode it uses.
    pub fn from_http(headers: &HeaderMap, body: &[u8]) -> Result<Vec<Self>, CloudEventError> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with(BATCH_CONTENT_TYPE) {
            Self::from_batch(body)
        } else if Self::is_binary(headers) {
            Ok(vec![Self::from_binary(headers, body)?])
        } else {
            Ok(vec![Self::from_structured(body)?])
        }
    }
}
