//! Event envelopes and publishing.
//!
//! # Data Flow
//! ```text
//! storage notification (event-grid schema, JSON array)
//!     → storage_event.rs (StorageEvent, BlobCreatedData)
//!
//! webhook delivery (structured / batch / binary content mode)
//!     → cloud_event.rs (CloudEvent + extension attributes)
//!
//! producer custom event
//!     → publisher.rs (EventPublisher → topic endpoint)
//! ```

pub mod cloud_event;
pub mod publisher;
pub mod storage_event;

pub use cloud_event::{CloudEvent, CloudEventError, TRACEPARENT_ATTRIBUTE};
pub use publisher::{EventPublisher, HttpEventPublisher, PublishError};
pub use storage_event::{
    BlobCreatedData, StorageEvent, SubscriptionValidationData, BLOB_CREATED,
    CUSTOM_BLOB_CREATED, SUBSCRIPTION_VALIDATION,
};
