//! Trace context value types.

use std::fmt;

use rand::Rng;

use crate::tracecontext::codec::CodecError;

/// A 128-bit trace identifier in its 32-character lowercase hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    /// Length of the hex representation.
    pub const HEX_LEN: usize = 32;

    /// Validate and wrap a hex trace id.
    pub fn parse(value: &str) -> Result<Self, CodecError> {
        validate_hex_id(value, Self::HEX_LEN, "trace id")?;
        Ok(Self(value.to_string()))
    }

    /// Generate a random, non-zero trace id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let value: u128 = loop {
            let candidate: u128 = rng.gen();
            if candidate != 0 {
                break candidate;
            }
        };
        Self(format!("{:032x}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 64-bit span identifier in its 16-character lowercase hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanId(String);

impl SpanId {
    /// Length of the hex representation.
    pub const HEX_LEN: usize = 16;

    /// Validate and wrap a hex span id.
    pub fn parse(value: &str) -> Result<Self, CodecError> {
        validate_hex_id(value, Self::HEX_LEN, "span id")?;
        Ok(Self(value.to_string()))
    }

    /// Generate a random, non-zero span id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let value: u64 = loop {
            let candidate: u64 = rng.gen();
            if candidate != 0 {
                break candidate;
            }
        };
        Self(format!("{:016x}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position within a distributed trace.
///
/// Created once per producer operation and consumed once per consumer
/// invocation. It is a plain value: nothing mutates it after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    /// Vendor-specific trace state, carried opaquely.
    pub trace_state: Option<String>,
}

impl TraceContext {
    pub fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            trace_id,
            span_id,
            trace_state: None,
        }
    }

    /// Attach trace state. An empty string is treated as no state.
    pub fn with_trace_state(mut self, trace_state: impl Into<String>) -> Self {
        let trace_state = trace_state.into();
        self.trace_state = if trace_state.is_empty() {
            None
        } else {
            Some(trace_state)
        };
        self
    }

    /// Start a new trace with random ids.
    pub fn new_root() -> Self {
        Self::new(TraceId::random(), SpanId::random())
    }

    /// A new span within the same trace, keeping the trace state.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: SpanId::random(),
            trace_state: self.trace_state.clone(),
        }
    }
}

/// Check a W3C id field: exact length, lowercase hex, not all zeros.
pub(crate) fn validate_hex_id(
    value: &str,
    expected: usize,
    field: &'static str,
) -> Result<(), CodecError> {
    if value.len() != expected {
        return Err(CodecError::InvalidLength {
            field,
            expected,
            actual: value.len(),
        });
    }
    check_lower_hex(value, field)?;
    if value.bytes().all(|b| b == b'0') {
        return Err(CodecError::AllZero { field });
    }
    Ok(())
}

pub(crate) fn check_lower_hex(value: &str, field: &'static str) -> Result<(), CodecError> {
    if value
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        Ok(())
    } else {
        Err(CodecError::InvalidHex { field })
    }
}
