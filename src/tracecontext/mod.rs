//! Trace context codec.
//!
//! # Data Flow
//! ```text
//! Producer:
//!     TraceContext → codec::encode → object metadata (traceid/spanid/tracestate)
//!     TraceContext → codec::format_traceparent → "00-{trace}-{span}-{flags}"
//!
//! Consumers:
//!     object metadata → codec::decode → TraceContext | NotPresent
//!     traceparent attribute → codec::parse_traceparent → TraceContext | Malformed
//!     TraceContext → Link → `_MS.links` span tag
//! ```
//!
//! # Design Decisions
//! - Ids are validated on construction; a malformed id never becomes a `TraceId`
//! - Traceparent parsing uses fixed offsets and rejects any other length
//! - Missing metadata is `Ok(None)`, malformed metadata is an error

pub mod codec;
pub mod context;
pub mod link;

pub use codec::{
    decode, encode, format_traceparent, parse_traceparent, CodecError, SPAN_ID_KEY,
    TRACEPARENT_LEN, TRACE_ID_KEY, TRACE_STATE_KEY,
};
pub use context::{SpanId, TraceContext, TraceId};
pub use link::{links_tag_value, Link, LINKS_TAG};
