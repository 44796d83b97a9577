//! In-memory object store.
//!
//! Backs the single-process deployment and the test harness. Wrap it in a
//! `RecordingObjectStore` to observe call order.

use async_trait::async_trait;
use dashmap::DashMap;
use url::Url;

use crate::storage::types::{
    ObjectLocator, ObjectMetadata, ObjectStore, StorageError, StorageResult, StoredObject,
};

#[derive(Debug, Clone, Default)]
struct MemoryObject {
    content: Vec<u8>,
    metadata: ObjectMetadata,
}

/// A thread-safe object store held entirely in memory.
pub struct MemoryObjectStore {
    locator: ObjectLocator,
    objects: DashMap<String, MemoryObject>,
}

impl MemoryObjectStore {
    pub fn new(locator: ObjectLocator) -> Self {
        Self {
            locator,
            objects: DashMap::new(),
        }
    }

    pub fn locator(&self) -> &ObjectLocator {
        &self.locator
    }

    /// Content of `name`, if stored.
    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.get(name).map(|o| o.content.clone())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, name: &str, content: Vec<u8>) -> StorageResult<StoredObject> {
        let url = self.locator.url_for(name)?;
        let size = content.len() as u64;
        self.objects.insert(
            name.to_string(),
            MemoryObject {
                content,
                metadata: ObjectMetadata::new(),
            },
        );
        Ok(StoredObject::new(name, url, size))
    }

    async fn set_metadata(
        &self,
        object: &StoredObject,
        metadata: ObjectMetadata,
    ) -> StorageResult<()> {
        let mut entry = self
            .objects
            .get_mut(object.name())
            .ok_or_else(|| StorageError::NotFound(object.name().to_string()))?;
        entry.metadata = metadata;
        Ok(())
    }

    async fn get_metadata(&self, url: &Url) -> StorageResult<ObjectMetadata> {
        let name = self.locator.name_for(url)?;
        self.objects
            .get(&name)
            .map(|o| o.metadata.clone())
            .ok_or(StorageError::NotFound(name))
    }
}
