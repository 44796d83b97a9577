//! Where a consumer looks for the producer's trace context.

use async_trait::async_trait;
use url::Url;

use crate::events::{BlobCreatedData, CloudEvent, TRACEPARENT_ATTRIBUTE};
use crate::storage::{ObjectStore, StorageError};
use crate::tracecontext::{decode, parse_traceparent, CodecError, SpanId, TraceContext, TraceId};

/// Result of looking for a trace context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(TraceContext),
    /// The channel carries no context; the normal uncorrelated case.
    NotPresent,
    /// Context was present but unusable.
    Malformed(CodecError),
}

impl From<Result<Option<TraceContext>, CodecError>> for Lookup {
    fn from(result: Result<Option<TraceContext>, CodecError>) -> Self {
        match result {
            Ok(Some(ctx)) => Lookup::Found(ctx),
            Ok(None) => Lookup::NotPresent,
            Err(e) => Lookup::Malformed(e),
        }
    }
}

/// One delivery path's view of the producer's trace context.
#[async_trait]
pub trait TraceContextSource: Send + Sync {
    /// Channel label for logs and metrics.
    fn channel(&self) -> &'static str;

    /// Look up the context. Only storage failures are errors.
    async fn lookup(&self) -> Result<Lookup, StorageError>;
}

/// Context stored in object metadata, fetched through the storage service.
pub struct ObjectMetadataSource<'a> {
    store: &'a dyn ObjectStore,
    url: &'a Url,
}

impl<'a> ObjectMetadataSource<'a> {
    pub fn new(store: &'a dyn ObjectStore, url: &'a Url) -> Self {
        Self { store, url }
    }
}

#[async_trait]
impl<'a> TraceContextSource for ObjectMetadataSource<'a> {
    fn channel(&self) -> &'static str {
        "object_metadata"
    }

    async fn lookup(&self) -> Result<Lookup, StorageError> {
        let metadata = self.store.get_metadata(self.url).await?;
        Ok(decode(&metadata).into())
    }
}

/// Context in the `traceparent` extension attribute of a CloudEvent.
pub struct CloudEventSource<'a> {
    event: &'a CloudEvent,
}

impl<'a> CloudEventSource<'a> {
    pub fn new(event: &'a CloudEvent) -> Self {
        Self { event }
    }
}

#[async_trait]
impl<'a> TraceContextSource for CloudEventSource<'a> {
    fn channel(&self) -> &'static str {
        "cloudevent_extension"
    }

    async fn lookup(&self) -> Result<Lookup, StorageError> {
        let lookup = match self.event.extension(TRACEPARENT_ATTRIBUTE) {
            Some(header) => match parse_traceparent(header) {
                Ok(ctx) => Lookup::Found(ctx),
                Err(e) => Lookup::Malformed(e),
            },
            None => Lookup::NotPresent,
        };
        Ok(lookup)
    }
}

/// Context carried in a custom-published blob event's payload.
pub struct EventPayloadSource<'a> {
    data: &'a BlobCreatedData,
}

impl<'a> EventPayloadSource<'a> {
    pub fn new(data: &'a BlobCreatedData) -> Self {
        Self { data }
    }
}

#[async_trait]
impl<'a> TraceContextSource for EventPayloadSource<'a> {
    fn channel(&self) -> &'static str {
        "event_payload"
    }

    async fn lookup(&self) -> Result<Lookup, StorageError> {
        let (Some(trace_id), Some(span_id)) =
            (&self.data.client_request_id, &self.data.request_id)
        else {
            return Ok(Lookup::NotPresent);
        };

        let parsed = TraceId::parse(trace_id)
            .and_then(|t| SpanId::parse(span_id).map(|s| TraceContext::new(t, s)));
        Ok(match parsed {
            Ok(ctx) => Lookup::Found(ctx),
            Err(e) => Lookup::Malformed(e),
        })
    }
}
