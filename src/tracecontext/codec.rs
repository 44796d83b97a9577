//! Encoding of trace context into object metadata and traceparent headers.

use thiserror::Error;

use crate::storage::ObjectMetadata;
use crate::tracecontext::context::{check_lower_hex, SpanId, TraceContext, TraceId};

/// Metadata key holding the 32-hex trace id.
pub const TRACE_ID_KEY: &str = "traceid";
/// Metadata key holding the 16-hex span id.
pub const SPAN_ID_KEY: &str = "spanid";
/// Metadata key holding the opaque trace state.
pub const TRACE_STATE_KEY: &str = "tracestate";

/// Exact length of a traceparent header.
pub const TRACEPARENT_LEN: usize = 55;

const TRACEPARENT_VERSION: &str = "00";
const TRACE_ID_RANGE: std::ops::Range<usize> = 3..35;
const SPAN_ID_RANGE: std::ops::Range<usize> = 36..52;
const SEPARATOR_OFFSETS: [usize; 3] = [2, 35, 52];

/// Errors for malformed trace context input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("{field} must be {expected} characters, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} contains characters outside lowercase hex")]
    InvalidHex { field: &'static str },

    #[error("{field} must not be all zeros")]
    AllZero { field: &'static str },

    #[error("traceparent must be 55 characters, got {0}")]
    TraceparentLength(usize),

    #[error("traceparent is missing the '-' separator at offset {0}")]
    TraceparentSeparator(usize),
}

impl TraceContext {
    /// Metadata pairs for this context.
    pub fn to_metadata(&self) -> ObjectMetadata {
        let mut metadata = ObjectMetadata::new();
        metadata.insert(TRACE_ID_KEY.to_string(), self.trace_id.to_string());
        metadata.insert(SPAN_ID_KEY.to_string(), self.span_id.to_string());
        metadata.insert(
            TRACE_STATE_KEY.to_string(),
            self.trace_state.clone().unwrap_or_default(),
        );
        metadata
    }
}

/// Encode raw ids into the metadata fragment written onto an object.
pub fn encode(
    trace_id: &str,
    span_id: &str,
    trace_state: Option<&str>,
) -> Result<ObjectMetadata, CodecError> {
    let ctx = TraceContext::new(TraceId::parse(trace_id)?, SpanId::parse(span_id)?)
        .with_trace_state(trace_state.unwrap_or_default());
    Ok(ctx.to_metadata())
}

/// Recover a trace context from object metadata.
///
/// Returns `Ok(None)` when either id key is absent: most objects are never
/// correlated and that is not an error.
pub fn decode(metadata: &ObjectMetadata) -> Result<Option<TraceContext>, CodecError> {
    let (Some(trace_id), Some(span_id)) = (metadata.get(TRACE_ID_KEY), metadata.get(SPAN_ID_KEY))
    else {
        return Ok(None);
    };

    let ctx = TraceContext::new(TraceId::parse(trace_id)?, SpanId::parse(span_id)?);
    let ctx = match metadata.get(TRACE_STATE_KEY) {
        Some(state) => ctx.with_trace_state(state.as_str()),
        None => ctx,
    };
    Ok(Some(ctx))
}

/// Parse a W3C traceparent header using its fixed byte offsets.
pub fn parse_traceparent(header: &str) -> Result<TraceContext, CodecError> {
    if header.len() != TRACEPARENT_LEN {
        return Err(CodecError::TraceparentLength(header.len()));
    }
    // Slicing below is byte-based.
    if !header.is_ascii() {
        return Err(CodecError::InvalidHex {
            field: "traceparent",
        });
    }

    let bytes = header.as_bytes();
    for offset in SEPARATOR_OFFSETS {
        if bytes[offset] != b'-' {
            return Err(CodecError::TraceparentSeparator(offset));
        }
    }

    check_lower_hex(&header[..2], "traceparent version")?;
    check_lower_hex(&header[53..], "traceparent flags")?;

    let trace_id = TraceId::parse(&header[TRACE_ID_RANGE])?;
    let span_id = SpanId::parse(&header[SPAN_ID_RANGE])?;
    Ok(TraceContext::new(trace_id, span_id))
}

/// Format a version-00 traceparent header for `ctx`.
pub fn format_traceparent(ctx: &TraceContext, sampled: bool) -> String {
    format!(
        "{}-{}-{}-{:02x}",
        TRACEPARENT_VERSION,
        ctx.trace_id,
        ctx.span_id,
        u8::from(sampled)
    )
}
