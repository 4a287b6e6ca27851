pub mod local;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use local::LocalFileStore;

/// Opaque handle returned by a [`FileStore`], stored on the owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file received in a multipart upload, held in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, file: &UploadedFile, subdirectory: &str) -> std::io::Result<FileRef>;

    /// Returns false if nothing was deleted.
    async fn delete(&self, file: &FileRef) -> bool;
}

/// Delete files that were stored for an operation that then failed.
pub async fn discard(store: &dyn FileStore, files: &[FileRef]) {
    for file in files {
        if !store.delete(file).await {
            tracing::warn!("Failed to discard stored file {file}");
        }
    }
}
