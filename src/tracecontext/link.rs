//! Cross-process span links in the backend's tag format.

use serde::{Deserialize, Serialize};

use crate::tracecontext::context::TraceContext;

/// Span tag key the tracing backend reads links from.
pub const LINKS_TAG: &str = "_MS.links";

/// A link from the consumer span back to the producer's operation.
///
/// Field names on the wire are fixed by the backend: `operation_Id` and `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "operation_Id")]
    pub operation_id: String,
    pub id: String,
}

impl Link {
    pub fn from_context(ctx: &TraceContext) -> Self {
        Self {
            operation_id: ctx.trace_id.to_string(),
            id: ctx.span_id.to_string(),
        }
    }
}

/// Serialize links as the JSON array stored under [`LINKS_TAG`].
pub fn links_tag_value(links: &[Link]) -> String {
    serde_json::to_string(links).unwrap_or_else(|_| "[]".to_string())
}
