//! Consumer side of the correlation protocol.
//!
//! # Data Flow
//! ```text
//! native notification ──▶ native.rs ──▶ ObjectMetadataSource ─┐
//!                                      (EventPayloadSource)  ├─▶ linker.rs ──▶ span tag `_MS.links`
//! webhook delivery ─────▶ cloudevents.rs ▶ CloudEventSource ──┘
//! ```
//!
//! # Design Decisions
//! - Every delivery path reduces to a `TraceContextSource`; link attachment
//!   is written once in `linker.rs`
//! - Missing and malformed context both end in "no link"; only storage
//!   failures propagate
//! - Handshake detection is a configurable predicate evaluated per request

pub mod cloudevents;
pub mod linker;
pub mod native;
pub mod source;
pub mod span;

pub use cloudevents::{CloudEventsConsumer, DeliveryReport, RequestKind, ALLOWED_ORIGIN_HEADER};
pub use linker::{attach_first_link, attach_link, LinkOutcome};
pub use native::{EventReport, NativeEventConsumer, NativeResponse};
pub use source::{CloudEventSource, EventPayloadSource, Lookup, ObjectMetadataSource, TraceContextSource};
pub use span::{consumer_span, SpanTags, TagRecorder};

use thiserror::Error;

use crate::events::CloudEventError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Metadata could not be read; the transport should redeliver.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The delivery body is not a valid envelope.
    #[error(transparent)]
    Envelope(#[from] CloudEventError),

    #[error("invalid storage event batch: {0}")]
    EventBatch(#[from] serde_json::Error),
}
