//! Storage types, errors and the `ObjectStore` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

/// Key/value metadata attached to a stored object.
pub type ObjectMetadata = HashMap<String, String>;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists under the given name.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The URL does not point into this store's container.
    #[error("URL '{0}' is outside the configured container")]
    ForeignUrl(String),

    /// Object name is empty or escapes the container.
    #[error("invalid object name '{0}'")]
    InvalidName(String),

    /// Base URL cannot address objects.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Handle to an object whose upload has been confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    name: String,
    url: Url,
    size: u64,
}

impl StoredObject {
    /// Only store implementations should construct handles, and only after
    /// the object is durable and visible.
    pub fn new(name: impl Into<String>, url: Url, size: u64) -> Self {
        Self {
            name: name.into(),
            url,
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Maps object names inside one container to public URLs and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocator {
    container_url: Url,
}

impl ObjectLocator {
    /// Build a locator for `container` under `base_url`.
    pub fn new(base_url: &str, container: &str) -> StorageResult<Self> {
        let mut base: Url = base_url
            .parse()
            .map_err(|e| StorageError::InvalidBaseUrl(format!("'{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(StorageError::InvalidBaseUrl(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        validate_name(container)?;

        let container_url = base
            .join(&format!("{}/", container.trim_matches('/')))
            .map_err(|e| StorageError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self { container_url })
    }

    pub fn container_url(&self) -> &Url {
        &self.container_url
    }

    /// Public URL of `name`.
    pub fn url_for(&self, name: &str) -> StorageResult<Url> {
        validate_name(name)?;
        self.container_url
            .join(name)
            .map_err(|_| StorageError::InvalidName(name.to_string()))
    }

    /// Object name addressed by `url`.
    ///
    /// Query and fragment are ignored, so signed URLs resolve to the same
    /// object. The path is percent-decoded before validation.
    pub fn name_for(&self, url: &Url) -> StorageResult<String> {
        if url.origin() != self.container_url.origin() {
            return Err(StorageError::ForeignUrl(url.to_string()));
        }
        let encoded = url
            .path()
            .strip_prefix(self.container_url.path())
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        let name = percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|_| StorageError::InvalidName(encoded.to_string()))?;
        validate_name(&name)?;
        Ok(name.into_owned())
    }
}

fn validate_name(name: &str) -> StorageResult<()> {
    let escapes = name
        .split('/')
        .any(|segment| segment == ".." || segment == ".");
    if name.is_empty() || name.starts_with('/') || escapes || name.contains('\\') {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Storage service as seen by the correlation code.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Store `content` under `name`; returns once the object is visible.
    async fn put(&self, name: &str, content: Vec<u8>) -> StorageResult<StoredObject>;

    /// Replace the metadata of a stored object.
    async fn set_metadata(
        &self,
        object: &StoredObject,
        metadata: ObjectMetadata,
    ) -> StorageResult<()>;

    /// Read the metadata of the object at `url`.
    async fn get_metadata(&self, url: &Url) -> StorageResult<ObjectMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_round_trip() {
        let locator = ObjectLocator::new("http://127.0.0.1:8080/objects", "uploads").unwrap();
        assert_eq!(
            locator.container_url().as_str(),
            "http://127.0.0.1:8080/objects/uploads/"
        );

        let url = locator.url_for("abc.png").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/objects/uploads/abc.png");
        assert_eq!(locator.name_for(&url).unwrap(), "abc.png");
    }

    #[test]
    fn test_locator_rejects_foreign_urls() {
        let locator = ObjectLocator::new("https://acct.blob.core.windows.net/", "uploads").unwrap();
        let other: Url = "https://acct.blob.core.windows.net/other/abc.png".parse().unwrap();
        assert!(matches!(
            locator.name_for(&other),
            Err(StorageError::ForeignUrl(_))
        ));
    }

    #[test]
    fn test_locator_ignores_query_and_decodes_path() {
        let locator = ObjectLocator::new("https://acct.blob.core.windows.net/", "uploads").unwrap();

        let signed: Url = "https://acct.blob.core.windows.net/uploads/abc.png?sv=2021-08-06&sig=x%2By"
            .parse()
            .unwrap();
        assert_eq!(locator.name_for(&signed).unwrap(), "abc.png");

        let url = locator.url_for("my picture.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/uploads/my%20picture.png"
        );
        assert_eq!(locator.name_for(&url).unwrap(), "my picture.png");
    }

    #[test]
    fn test_locator_rejects_other_hosts_and_encoded_escapes() {
        let locator = ObjectLocator::new("https://acct.blob.core.windows.net/", "uploads").unwrap();

        let other_host: Url = "https://evil.example.com/uploads/abc.png".parse().unwrap();
        assert!(matches!(
            locator.name_for(&other_host),
            Err(StorageError::ForeignUrl(_))
        ));

        let escaping: Url = "https://acct.blob.core.windows.net/uploads/a%2F..%2Fb.png"
            .parse()
            .unwrap();
        assert!(matches!(
            locator.name_for(&escaping),
            Err(StorageError::InvalidName(_))
        ));
    }

    #[test]
    fn test_invalid_names() {
        let locator = ObjectLocator::new("http://localhost/", "uploads").unwrap();
        for name in ["", "/abs.png", "a/../b.png", "..\\x"] {
            assert!(locator.url_for(name).is_err(), "{name} should be rejected");
        }
        assert!(ObjectLocator::new("not a url", "uploads").is_err());
        assert!(ObjectLocator::new("http://localhost/", "..").is_err());
    }
}
