//! Producer side of the correlation protocol.
//!
//! # Data Flow
//! ```text
//! explicit TraceContext + payload bytes
//!     → ObjectStore::put (confirmed)
//!     → metadata mode:     correlate_upload → set_metadata(traceid, spanid, tracestate)
//!     → custom-event mode: publish_custom_event → EventPublisher (clientRequestId/requestId)
//! ```
//!
//! # Design Decisions
//! - The trace context is a parameter, never read from ambient span state
//! - The two modes are alternate channels; custom mode writes no metadata
//! - The payload location is injected configuration

pub mod correlator;
pub mod payload;

pub use correlator::{ProducerCorrelator, ProducerError, UploadMode, UploadReceipt};
pub use payload::PayloadSource;
