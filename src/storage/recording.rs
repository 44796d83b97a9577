//! Call-order recording around any object store.
//!
//! Opt-in instrumentation for harnesses that need to see the order in which
//! a producer or consumer touched storage. The journal grows with every
//! successful call and is never trimmed, so keep it off long-running paths.

use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::storage::types::{ObjectMetadata, ObjectStore, StorageResult, StoredObject};

/// One successful store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Put(String),
    SetMetadata(String),
    GetMetadata(Url),
}

/// Forwards to `inner` and journals every call that succeeded.
pub struct RecordingObjectStore<S> {
    inner: S,
    journal: Mutex<Vec<StoreOperation>>,
}

impl<S: ObjectStore> RecordingObjectStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            journal: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Snapshot of the journal, oldest first.
    pub fn journal(&self) -> Vec<StoreOperation> {
        self.journal
            .lock()
            .expect("store journal mutex poisoned")
            .clone()
    }

    /// Drop everything journaled so far.
    pub fn clear(&self) {
        self.journal
            .lock()
            .expect("store journal mutex poisoned")
            .clear();
    }

    fn record(&self, op: StoreOperation) {
        self.journal
            .lock()
            .expect("store journal mutex poisoned")
            .push(op);
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for RecordingObjectStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn put(&self, name: &str, content: Vec<u8>) -> StorageResult<StoredObject> {
        let object = self.inner.put(name, content).await?;
        self.record(StoreOperation::Put(object.name().to_string()));
        Ok(object)
    }

    async fn set_metadata(
        &self,
        object: &StoredObject,
        metadata: ObjectMetadata,
    ) -> StorageResult<()> {
        self.inner.set_metadata(object, metadata).await?;
        self.record(StoreOperation::SetMetadata(object.name().to_string()));
        Ok(())
    }

    async fn get_metadata(&self, url: &Url) -> StorageResult<ObjectMetadata> {
        let metadata = self.inner.get_metadata(url).await?;
        self.record(StoreOperation::GetMetadata(url.clone()));
        Ok(metadata)
    }
}
