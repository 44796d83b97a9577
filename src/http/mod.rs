//! HTTP hosting shell.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, inbound traceparent)
//!     → handlers.rs (producer / consumer operation, status mapping)
//!     → JSON response
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use handlers::UploadResponse;
pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
