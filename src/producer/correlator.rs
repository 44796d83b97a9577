//! Attaches the producer's trace context to uploaded objects.

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::events::{BlobCreatedData, EventPublisher, PublishError, StorageEvent, CUSTOM_BLOB_CREATED};
use crate::observability::metrics;
use crate::storage::{ObjectStore, StorageError, StoredObject};
use crate::tracecontext::TraceContext;

/// Subject stamped on custom events.
pub const DEFAULT_EVENT_SUBJECT: &str = "fileUploader";
const CUSTOM_EVENT_DATA_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("no event publisher is configured")]
    PublisherNotConfigured,

    #[error("failed to serialize event data: {0}")]
    EventData(#[from] serde_json::Error),
}

/// Channel the producer uses to hand its context downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Trace ids written into object metadata.
    Metadata,
    /// Trace ids carried in a directly published event.
    CustomEvent,
}

impl UploadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMode::Metadata => "metadata",
            UploadMode::CustomEvent => "custom_event",
        }
    }
}

/// Result of a completed producer operation.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub object: StoredObject,
    pub trace: TraceContext,
    pub mode: UploadMode,
    /// Id of the published event, in custom-event mode.
    pub event_id: Option<String>,
}

/// Producer correlator.
pub struct ProducerCorrelator {
    store: Arc<dyn ObjectStore>,
    publisher: Option<Arc<dyn EventPublisher>>,
    event_type: String,
    event_subject: String,
}

impl ProducerCorrelator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            publisher: None,
            event_type: CUSTOM_BLOB_CREATED.to_string(),
            event_subject: DEFAULT_EVENT_SUBJECT.to_string(),
        }
    }

    /// Enable custom-event mode.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn with_event_subject(mut self, subject: impl Into<String>) -> Self {
        self.event_subject = subject.into();
        self
    }

    pub fn has_publisher(&self) -> bool {
        self.publisher.is_some()
    }

    /// Write `ctx` into the metadata of an object whose upload is confirmed.
    pub async fn correlate_upload(
        &self,
        ctx: &TraceContext,
        object: &StoredObject,
    ) -> Result<(), ProducerError> {
        tracing::info!(
            object_url = %object.url(),
            trace_id = %ctx.trace_id,
            span_id = %ctx.span_id,
            "Setting trace metadata"
        );
        self.store.set_metadata(object, ctx.to_metadata()).await?;
        Ok(())
    }

    /// Publish a blob-created event carrying `ctx` in its payload.
    pub async fn publish_custom_event(
        &self,
        ctx: &TraceContext,
        object_url: &Url,
    ) -> Result<StorageEvent, ProducerError> {
        let publisher = self
            .publisher
            .as_ref()
            .ok_or(ProducerError::PublisherNotConfigured)?;

        let mut data = BlobCreatedData::block_upload(object_url.clone());
        data.client_request_id = Some(ctx.trace_id.to_string());
        data.request_id = Some(ctx.span_id.to_string());

        let event = StorageEvent::new(
            self.event_subject.as_str(),
            self.event_type.as_str(),
            CUSTOM_EVENT_DATA_VERSION,
            serde_json::to_value(&data)?,
        );

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            object_url = %object_url,
            "Sending custom storage event"
        );
        publisher.publish(std::slice::from_ref(&event)).await?;
        Ok(event)
    }

    /// Upload `content` as `name`, then hand `ctx` downstream through `mode`.
    pub async fn upload(
        &self,
        ctx: &TraceContext,
        name: &str,
        content: Vec<u8>,
        mode: UploadMode,
    ) -> Result<UploadReceipt, ProducerError> {
        if mode == UploadMode::CustomEvent && self.publisher.is_none() {
            return Err(ProducerError::PublisherNotConfigured);
        }

        tracing::info!(object = %name, store = self.store.name(), "Uploading object");
        let object = match self.store.put(name, content).await {
            Ok(object) => object,
            Err(e) => {
                metrics::record_upload(mode.as_str(), "failed");
                return Err(e.into());
            }
        };

        let event_id = match mode {
            UploadMode::Metadata => self.correlate_upload(ctx, &object).await.map(|_| None),
            UploadMode::CustomEvent => self
                .publish_custom_event(ctx, object.url())
                .await
                .map(|event| Some(event.id)),
        };
        let event_id = match event_id {
            Ok(id) => id,
            Err(e) => {
                metrics::record_upload(mode.as_str(), "failed");
                return Err(e);
            }
        };

        metrics::record_upload(mode.as_str(), "ok");
        Ok(UploadReceipt {
            object,
            trace: ctx.clone(),
            mode,
            event_id,
        })
    }
}
