//! Local filesystem object store.
//!
//! Objects live at `{root}/{container}/{name}`; metadata sits next to them in
//! a `{name}.metadata.json` sidecar. Separate producer and consumer processes
//! on one host can share a root directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::storage::types::{
    ObjectLocator, ObjectMetadata, ObjectStore, StorageError, StorageResult, StoredObject,
};

const METADATA_SUFFIX: &str = ".metadata.json";

pub struct FilesystemObjectStore {
    locator: ObjectLocator,
    container_dir: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl AsRef<Path>, container: &str, locator: ObjectLocator) -> Self {
        Self {
            locator,
            container_dir: root.as_ref().join(container),
        }
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.container_dir.join(name)
    }

    fn metadata_path(&self, name: &str) -> PathBuf {
        self.container_dir.join(format!("{}{}", name, METADATA_SUFFIX))
    }

    async fn ensure_exists(&self, name: &str) -> StorageResult<()> {
        if tokio::fs::try_exists(self.object_path(name)).await? {
            Ok(())
        } else {
            Err(StorageError::NotFound(name.to_string()))
        }
    }
}

/// Write via a temp file and rename so readers never see partial content.
async fn write_atomic(path: &Path, content: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn put(&self, name: &str, content: Vec<u8>) -> StorageResult<StoredObject> {
        let url = self.locator.url_for(name)?;
        let size = content.len() as u64;
        write_atomic(&self.object_path(name), &content).await?;
        // A re-upload starts without metadata, as a fresh blob would.
        match tokio::fs::remove_file(self.metadata_path(name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(object = %name, size, "Object written to disk");
        Ok(StoredObject::new(name, url, size))
    }

    async fn set_metadata(
        &self,
        object: &StoredObject,
        metadata: ObjectMetadata,
    ) -> StorageResult<()> {
        self.ensure_exists(object.name()).await?;
        let json = serde_json::to_vec(&metadata)?;
        write_atomic(&self.metadata_path(object.name()), &json).await
    }

    async fn get_metadata(&self, url: &Url) -> StorageResult<ObjectMetadata> {
        let name = self.locator.name_for(url)?;
        self.ensure_exists(&name).await?;
        match tokio::fs::read(self.metadata_path(&name)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ObjectMetadata::new()),
            Err(e) => Err(e.into()),
        }
    }
}
