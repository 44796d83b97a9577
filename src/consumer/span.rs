//! Span tag sinks.

use std::sync::Mutex;

use crate::tracecontext::LINKS_TAG;

/// Something that accepts string tags for the consumer's own span.
pub trait SpanTags: Send + Sync {
    fn add_tag(&self, key: &str, value: &str);
}

impl SpanTags for tracing::Span {
    fn add_tag(&self, key: &str, value: &str) {
        // Only fields declared at creation are recorded; see `consumer_span`.
        self.record(key, value);
    }
}

/// Fresh span for one consumer invocation, with the links tag declared.
pub fn consumer_span(function: &'static str, event_id: &str) -> tracing::Span {
    tracing::info_span!(
        "consume_upload_event",
        function,
        event_id = %event_id,
        "_MS.links" = tracing::field::Empty,
    )
}

/// Collects tags in memory.
#[derive(Debug, Default)]
pub struct TagRecorder {
    tags: Mutex<Vec<(String, String)>>,
}

impl TagRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.tags
            .lock()
            .expect("tag recorder mutex poisoned")
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Value of the links tag, if any link was attached.
    pub fn links(&self) -> Option<String> {
        self.get(LINKS_TAG)
    }

    pub fn is_empty(&self) -> bool {
        self.tags
            .lock()
            .expect("tag recorder mutex poisoned")
            .is_empty()
    }
}

impl SpanTags for TagRecorder {
    fn add_tag(&self, key: &str, value: &str) {
        self.tags
            .lock()
            .expect("tag recorder mutex poisoned")
            .push((key.to_string(), value.to_string()));
    }
}
