//! Backend

use crate::storage::{decode_records, encode_records, StorageBackend};
use crate::task::TaskRecord;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// JSON file storage backend
///
/// The whole list lives in one file as a JSON array and is rewritten in full
/// on every save.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn ensure_exists(&self) -> crate::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                crate::TaskManagerError::PersistenceWriteFailure(format!(
                    "{}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await;

        match created {
            Ok(mut file) => {
                let written = async {
                    file.write_all(b"[]").await?;
                    file.flush().await
                };
                written.await.map_err(|e| {
                    crate::TaskManagerError::PersistenceWriteFailure(format!(
                        "{}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                info!("Created empty task file at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(crate::TaskManagerError::PersistenceWriteFailure(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn load(&self) -> crate::Result<Vec<TaskRecord>> {
        info!("Loading tasks from file: {}", self.path.display());
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            crate::TaskManagerError::PersistenceReadFailure(format!(
                "{}: {}",
                self.path.display(),
                e
            ))
        })?;

        let records = decode_records(&contents)?;
        info!("Loaded {} tasks from {}", records.len(), self.path.display());
        Ok(records)
    }

    async fn save(&self, records: &[TaskRecord]) -> crate::Result<()> {
        let contents = encode_records(records)?;
        tokio::fs::write(&self.path, contents).await.map_err(|e| {
            crate::TaskManagerError::PersistenceWriteFailure(format!(
                "{}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!("Saved {} tasks to {}", records.len(), self.path.display());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}

/// In-memory storage backend implementation
///
/// Holds the encoded document rather than the records so loads go through
/// the same decoding as the file backend.
pub struct MemoryBackend {
    document: Arc<RwLock<Option<String>>>,
}

impl MemoryBackend {
    /// Create a new, empty in-memory storage backend
    pub fn new() -> Self {
        Self {
            document: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a backend that already holds `document`
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Arc::new(RwLock::new(Some(document.into()))),
        }
    }

    /// The currently stored document, if any
    pub async fn document(&self) -> Option<String> {
        self.document.read().await.clone()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn ensure_exists(&self) -> crate::Result<()> {
        let mut document = self.document.write().await;
        if document.is_none() {
            *document = Some("[]".to_string());
        }
        Ok(())
    }

    async fn load(&self) -> crate::Result<Vec<TaskRecord>> {
        let document = self.document.read().await;
        match document.as_deref() {
            Some(contents) => decode_records(contents),
            None => Err(crate::TaskManagerError::PersistenceReadFailure(
                "nothing stored".to_string(),
            )),
        }
    }

    async fn save(&self, records: &[TaskRecord]) -> crate::Result<()> {
        let contents = encode_records(records)?;
        *self.document.write().await = Some(contents);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
