//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;
use url::Url;

use crate::config::schema::{HandshakeRule, ServiceConfig, StorageBackend};
use crate::storage::ObjectLocator;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a valid URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("webhook.handshake: '{0}' is not a valid HTTP method")]
    InvalidMethod(String),

    #[error("producer.access_key is required when producer.publish_endpoint is set")]
    MissingAccessKey,
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.request_timeout_secs",
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_body_bytes",
        });
    }

    if config.storage.container.is_empty() {
        errors.push(ValidationError::Empty {
            field: "storage.container",
        });
    } else if ObjectLocator::new(&config.storage.base_url, &config.storage.container).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "storage.base_url",
            value: config.storage.base_url.clone(),
        });
    }
    if config.storage.backend == StorageBackend::Filesystem && config.storage.root.is_empty() {
        errors.push(ValidationError::Empty {
            field: "storage.root",
        });
    }

    if config.producer.payload_path.is_empty() {
        errors.push(ValidationError::Empty {
            field: "producer.payload_path",
        });
    }
    if config.producer.custom_event_type.is_empty() {
        errors.push(ValidationError::Empty {
            field: "producer.custom_event_type",
        });
    }
    if let Some(endpoint) = &config.producer.publish_endpoint {
        if endpoint.parse::<Url>().is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: "producer.publish_endpoint",
                value: endpoint.clone(),
            });
        }
        if config.producer.access_key.is_empty() {
            errors.push(ValidationError::MissingAccessKey);
        }
        if config.producer.publish_timeout_secs == 0 {
            errors.push(ValidationError::Zero {
                field: "producer.publish_timeout_secs",
            });
        }
    }

    if config.webhook.allowed_origin.is_empty() {
        errors.push(ValidationError::Empty {
            field: "webhook.allowed_origin",
        });
    }
    match &config.webhook.handshake {
        HandshakeRule::Method { method } => {
            if method.is_empty() || Method::from_bytes(method.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidMethod(method.clone()));
            }
        }
        HandshakeRule::Header { name } => {
            if name.is_empty() {
                errors.push(ValidationError::Empty {
                    field: "webhook.handshake.name",
                });
            }
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
