//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the upload tracer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Object storage backend.
    pub storage: StorageConfig,

    /// Producer trigger settings.
    pub producer: ProducerConfig,

    /// CloudEvents webhook settings.
    pub webhook: WebhookConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Which object store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-process store; producer and consumers must share one process.
    Memory,
    /// Objects and metadata sidecars under `root`.
    Filesystem,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Root directory for the filesystem backend.
    pub root: String,

    /// Container that uploads go into.
    pub container: String,

    /// Public base URL objects are addressed by in events.
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            root: "./data/storage".to_string(),
            container: "uploads".to_string(),
            base_url: "http://127.0.0.1:8080/objects/".to_string(),
        }
    }
}

/// Producer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// File uploaded on every trigger, already resolved for this host.
    pub payload_path: String,

    /// Topic endpoint for custom events; custom mode is off when unset.
    pub publish_endpoint: Option<String>,

    /// Topic access key.
    pub access_key: String,

    /// Event type of custom events.
    pub custom_event_type: String,

    /// Subject of custom events.
    pub event_subject: String,

    /// Publish request timeout in seconds.
    pub publish_timeout_secs: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            payload_path: "./Data/picture.png".to_string(),
            publish_endpoint: None,
            access_key: String::new(),
            custom_event_type: "Custom.Storage.BlobCreated".to_string(),
            event_subject: "fileUploader".to_string(),
            publish_timeout_secs: 10,
        }
    }
}

/// Rule that marks a webhook request as a subscription handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum HandshakeRule {
    /// Requests with this HTTP method (case-insensitive).
    Method { method: String },
    /// Requests carrying this header.
    Header { name: String },
}

impl Default for HandshakeRule {
    fn default() -> Self {
        HandshakeRule::Method {
            method: "OPTIONS".to_string(),
        }
    }
}

/// CloudEvents webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Origin echoed in `Webhook-Allowed-Origin` on handshakes.
    pub allowed_origin: String,

    pub handshake: HandshakeRule,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "eventgrid.azure.net".to_string(),
            handshake: HandshakeRule::default(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
