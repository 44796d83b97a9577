//! Consumer triggered by storage notifications.

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use crate::consumer::linker::{attach_first_link, LinkOutcome};
use crate::consumer::source::{EventPayloadSource, ObjectMetadataSource, TraceContextSource};
use crate::consumer::span::{consumer_span, SpanTags};
use crate::consumer::ConsumerError;
use crate::events::{StorageEvent, CUSTOM_BLOB_CREATED};
use crate::storage::ObjectStore;

const FUNCTION_NAME: &str = "UploadProcessor";

/// Outcome of one event within a delivered batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReport {
    pub id: String,
    #[serde(flatten)]
    pub outcome: LinkOutcome,
}

/// Reply to a native webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NativeResponse {
    /// Echo of the subscription validation code.
    Validation {
        #[serde(rename = "validationResponse")]
        validation_response: String,
    },
    /// Every event was processed and is acknowledged.
    Processed { events: Vec<EventReport> },
}

/// Links spans for storage notifications via object metadata.
pub struct NativeEventConsumer {
    store: Arc<dyn ObjectStore>,
    custom_event_type: String,
}

impl NativeEventConsumer {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            custom_event_type: CUSTOM_BLOB_CREATED.to_string(),
        }
    }

    /// Event type whose payload may carry trace ids directly.
    pub fn with_custom_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.custom_event_type = event_type.into();
        self
    }

    /// Correlate one notification, tagging `span`.
    ///
    /// Succeeds whether or not a link was attached; only a failed metadata
    /// read is an error.
    pub async fn on_notified(
        &self,
        event: &StorageEvent,
        span: &dyn SpanTags,
    ) -> Result<LinkOutcome, ConsumerError> {
        let data = match event.blob_created_data() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    error = %e,
                    "Event does not reference an object, acknowledging without link"
                );
                return Ok(LinkOutcome::NotPresent);
            }
        };

        tracing::info!(object_url = %data.url, "Processing...");

        let metadata = ObjectMetadataSource::new(self.store.as_ref(), &data.url);
        let payload = EventPayloadSource::new(&data);
        // Metadata wins; the payload is only trusted on custom-published events.
        let mut sources: Vec<&dyn TraceContextSource> = vec![&metadata];
        if event.event_type == self.custom_event_type {
            sources.push(&payload);
        }
        let outcome = attach_first_link(&sources, span).await?;

        tracing::info!(outcome = outcome.as_str(), "Done.");
        Ok(outcome)
    }

    /// Handle one webhook delivery (a batch in the event-grid schema).
    ///
    /// Each event gets its own fresh span.
    pub async fn handle_batch(
        &self,
        events: &[StorageEvent],
    ) -> Result<NativeResponse, ConsumerError> {
        if let Some(validation) = events.iter().find(|e| e.is_subscription_validation()) {
            let data = validation.validation_data()?;
            tracing::info!(event_id = %validation.id, "Answering subscription validation");
            return Ok(NativeResponse::Validation {
                validation_response: data.validation_code,
            });
        }

        let mut reports = Vec::with_capacity(events.len());
        for event in events {
            let span = consumer_span(FUNCTION_NAME, &event.id);
            let outcome = self
                .on_notified(event, &span)
                .instrument(span.clone())
                .await?;
            reports.push(EventReport {
                id: event.id.clone(),
                outcome,
            });
        }
        Ok(NativeResponse::Processed { events: reports })
    }
}
