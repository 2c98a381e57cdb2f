//! Task store

use crate::storage::StorageBackend;
use crate::task::{TaskFields, TaskRecord};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Ordered, shared list of tasks with write-through persistence
///
/// A task's position in the list is its index. Every operation runs under one
/// lock, and every mutation saves the full list before the lock is released,
/// so the stored document never sees interleaved writes.
///
/// Mutations run on their own spawned task: dropping the caller's future does
/// not stop a change half way between memory and storage.
pub struct TaskStore {
    records: Arc<Mutex<Vec<TaskRecord>>>,
    backend: Arc<dyn StorageBackend>,
    strict_persistence: bool,
}

impl TaskStore {
    /// Create an empty store over `backend` without loading anything
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            backend,
            strict_persistence: false,
        }
    }

    /// Create a store and load whatever `backend` holds.
    ///
    /// Storage that cannot be created or read leaves the store empty; the
    /// failure is logged and the store stays usable.
    pub async fn open(backend: Arc<dyn StorageBackend>) -> Self {
        let store = Self::new(backend);
        if let Err(e) = store.reload().await {
            error!("Starting with an empty task list: {}", e);
        }
        store
    }

    /// Report failed saves to the caller instead of only logging them
    pub fn with_strict_persistence(mut self, strict: bool) -> Self {
        self.strict_persistence = strict;
        self
    }

    /// Replace the in-memory list with the stored one, returning its size.
    /// On failure the in-memory list is left empty.
    pub async fn reload(&self) -> crate::Result<usize> {
        let records = Arc::clone(&self.records);
        let backend = Arc::clone(&self.backend);

        let handle = tokio::spawn(async move {
            let mut records = records.lock().await;
            let loaded: crate::Result<Vec<TaskRecord>> = async {
                backend.ensure_exists().await?;
                backend.load().await
            }
            .await;

            match loaded {
                Ok(loaded) => {
                    *records = loaded;
                    info!("Task store holds {} tasks", records.len());
                    Ok(records.len())
                }
                Err(e) => {
                    records.clear();
                    Err(e)
                }
            }
        });

        handle
            .await
            .map_err(|e| crate::TaskManagerError::OperationAborted(e.to_string()))?
    }

    /// Snapshot of all tasks in order
    pub async fn list(&self) -> Vec<TaskRecord> {
        self.records.lock().await.clone()
    }

    /// Number of tasks
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Append a new task, returning its index and the stored record
    pub async fn append(&self, fields: TaskFields) -> crate::Result<(usize, TaskRecord)> {
        let record = TaskRecord::from_fields(fields)?;

        self.mutate(move |records| {
            records.push(record.clone());
            let index = records.len() - 1;
            info!("Task {} added: {}", index, record.name);
            Ok((index, record))
        })
        .await
    }

    /// Get the task at `index`
    pub async fn get(&self, index: i64) -> crate::Result<TaskRecord> {
        let records = self.records.lock().await;
        let position = locate(records.len(), index)?;
        Ok(records[position].clone())
    }

    /// Overwrite the task at `index` with `fields`
    pub async fn update(&self, index: i64, fields: TaskFields) -> crate::Result<TaskRecord> {
        self.mutate(move |records| {
            let position = locate(records.len(), index)?;
            records[position].apply(fields)?;
            info!("Task {} updated: {}", position, records[position].name);
            Ok(records[position].clone())
        })
        .await
    }

    /// Set only the completion flag of the task at `index`
    pub async fn set_completed(&self, index: i64, completed: bool) -> crate::Result<TaskRecord> {
        self.mutate(move |records| {
            let position = locate(records.len(), index)?;
            records[position].completed = completed;
            info!("Task {} marked completed={}", position, completed);
            Ok(records[position].clone())
        })
        .await
    }

    /// Remove the task at `index`; later tasks move down by one
    pub async fn remove(&self, index: i64) -> crate::Result<TaskRecord> {
        self.mutate(move |records| {
            let position = locate(records.len(), index)?;
            let removed = records.remove(position);
            info!("Task {} removed: {}", position, removed.name);
            Ok(removed)
        })
        .await
    }

    /// Check if the storage backend is usable
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    /// Apply `change` and save the result under the lock, on a spawned task.
    ///
    /// `change` must leave the list untouched when it returns an error; no
    /// save happens in that case.
    async fn mutate<T, F>(&self, change: F) -> crate::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<TaskRecord>) -> crate::Result<T> + Send + 'static,
    {
        let records = Arc::clone(&self.records);
        let backend = Arc::clone(&self.backend);
        let strict = self.strict_persistence;

        let handle = tokio::spawn(async move {
            let mut records = records.lock().await;
            let output = change(&mut *records)?;
            persist(backend.as_ref(), &records, strict).await?;
            Ok::<T, crate::TaskManagerError>(output)
        });

        handle
            .await
            .map_err(|e| crate::TaskManagerError::OperationAborted(e.to_string()))?
    }
}

/// Save the full list. Only fails in strict mode; the caller's mutation has
/// already happened either way.
async fn persist(
    backend: &dyn StorageBackend,
    records: &[TaskRecord],
    strict: bool,
) -> crate::Result<()> {
    match backend.save(records).await {
        Ok(()) => {
            debug!("Persisted {} tasks", records.len());
            Ok(())
        }
        Err(e) if strict => {
            error!("Failed to persist tasks: {}", e);
            Err(e)
        }
        Err(e) => {
            error!("Failed to persist tasks: {}", e);
            Ok(())
        }
    }
}

fn locate(len: usize, index: i64) -> crate::Result<usize> {
    match usize::try_from(index) {
        Ok(position) if position < len => Ok(position),
        _ => {
            warn!("Task index {} out of range (size {})", index, len);
            Err(crate::TaskManagerError::IndexOutOfRange(index))
        }
    }
}
