use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::{FileRef, FileStore, UploadedFile};

/// Stores files under a root directory on local disk. References are paths
/// relative to the root.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a reference, refusing anything that escapes the root.
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        if path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.root.join(path))
        } else {
            None
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, file: &UploadedFile, subdirectory: &str) -> std::io::Result<FileRef> {
        let dir = self.resolve(subdirectory).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid storage subdirectory: {subdirectory}"),
            )
        })?;
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}{}", Uuid::now_v7(), extension_of(&file.file_name));
        tokio::fs::write(dir.join(&name), &file.data).await?;

        tracing::debug!(
            "Stored {} ({} bytes) as {subdirectory}/{name}",
            file.file_name,
            file.data.len()
        );
        Ok(FileRef(format!("{subdirectory}/{name}")))
    }

    async fn delete(&self, file: &FileRef) -> bool {
        let Some(path) = self.resolve(file.as_str()) else {
            return false;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Failed to delete {}: {e}", path.display());
                false
            }
        }
    }
}

/// Keep a short alphanumeric extension from the client's file name.
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
