//! Attaches a cross-process link to the consumer's span.

use serde::Serialize;

use crate::consumer::source::{Lookup, TraceContextSource};
use crate::consumer::span::SpanTags;
use crate::observability::metrics;
use crate::storage::StorageError;
use crate::tracecontext::{links_tag_value, Link, LINKS_TAG};

/// What happened to one invocation's correlation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "link", rename_all = "snake_case")]
pub enum LinkOutcome {
    Linked(Link),
    NotPresent,
    Malformed,
}

impl LinkOutcome {
    pub fn link(&self) -> Option<&Link> {
        match self {
            LinkOutcome::Linked(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkOutcome::Linked(_) => "linked",
            LinkOutcome::NotPresent => "not_present",
            LinkOutcome::Malformed => "malformed",
        }
    }
}

/// Look up a context from `source` and link `span` to it when found.
pub async fn attach_link(
    source: &dyn TraceContextSource,
    span: &dyn SpanTags,
) -> Result<LinkOutcome, StorageError> {
    let sources: [&dyn TraceContextSource; 1] = [source];
    attach_first_link(&sources, span).await
}

/// Try `sources` in order; the first context found is linked.
///
/// When nothing is found the outcome is `Malformed` if any source held an
/// unusable context, `NotPresent` otherwise. Storage errors abort the attempt.
pub async fn attach_first_link(
    sources: &[&dyn TraceContextSource],
    span: &dyn SpanTags,
) -> Result<LinkOutcome, StorageError> {
    let mut outcome = LinkOutcome::NotPresent;
    let mut channel = sources.first().map(|s| s.channel()).unwrap_or("none");

    for source in sources {
        match source.lookup().await? {
            Lookup::Found(ctx) => {
                let link = Link::from_context(&ctx);
                span.add_tag(LINKS_TAG, &links_tag_value(std::slice::from_ref(&link)));
                tracing::info!(
                    channel = source.channel(),
                    operation_id = %link.operation_id,
                    parent_span_id = %link.id,
                    "Linked to producer operation"
                );
                outcome = LinkOutcome::Linked(link);
                channel = source.channel();
                break;
            }
            Lookup::Malformed(e) => {
                tracing::warn!(
                    channel = source.channel(),
                    error = %e,
                    "Ignoring malformed trace context"
                );
                outcome = LinkOutcome::Malformed;
                channel = source.channel();
            }
            Lookup::NotPresent => {
                tracing::debug!(channel = source.channel(), "No trace context present");
            }
        }
    }

    metrics::record_link(channel, outcome.as_str());
    Ok(outcome)
}
