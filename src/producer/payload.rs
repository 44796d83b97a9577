//! Payload uploaded by the producer trigger.

use std::path::{Path, PathBuf};

/// File uploaded on every producer invocation.
///
/// The path is resolved by the hosting shell (configuration), so the
/// producer never branches on which environment it runs in.
#[derive(Debug, Clone)]
pub struct PayloadSource {
    path: PathBuf,
}

impl PayloadSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Fresh object name `{uuid}.{ext}`, keeping the payload's extension.
    pub fn object_name(&self) -> String {
        let id = uuid::Uuid::new_v4();
        match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => format!("{}.{}", id, ext),
            _ => format!("{}.bin", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_keeps_extension() {
        let name = PayloadSource::new("Data/picture.png").object_name();
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 36 + 4);

        let a = PayloadSource::new("Data/blob").object_name();
        let b = PayloadSource::new("Data/blob").object_name();
        assert!(a.ends_with(".bin"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_read_missing_payload() {
        let source = PayloadSource::new("/definitely/not/here.png");
        assert!(source.read().await.is_err());
    }
}
