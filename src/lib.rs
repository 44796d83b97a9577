//! Upload tracer library.
//!
//! Correlates a producer that uploads an object with the consumers that
//! process the resulting storage event, by carrying W3C trace context
//! through object metadata, CloudEvents extensions, or custom event payloads.

pub mod config;
pub mod consumer;
pub mod events;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod producer;
pub mod storage;
pub mod tracecontext;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
