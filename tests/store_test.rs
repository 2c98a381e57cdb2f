use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use task_manager_rs::storage::backend::{JsonFileBackend, MemoryBackend};
use task_manager_rs::storage::StorageBackend;
use task_manager_rs::task::{TaskFields, TaskRecord};
use task_manager_rs::{TaskManagerError, TaskStore};
use tempfile::TempDir;
use tokio::time::{sleep, timeout, Duration};

/// Memory backend whose saves take a while and whose setup can be made to fail
struct SlowBackend {
    inner: MemoryBackend,
    save_delay: Duration,
    fail_setup: AtomicBool,
}

impl SlowBackend {
    fn new(save_delay: Duration) -> Self {
        Self {
            inner: MemoryBackend::new(),
            save_delay,
            fail_setup: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl StorageBackend for SlowBackend {
    async fn ensure_exists(&self) -> task_manager_rs::Result<()> {
        if self.fail_setup.load(Ordering::SeqCst) {
            return Err(TaskManagerError::PersistenceWriteFailure(
                "read-only".to_string(),
            ));
        }
        self.inner.ensure_exists().await
    }

    async fn load(&self) -> task_manager_rs::Result<Vec<TaskRecord>> {
        self.inner.load().await
    }

    async fn save(&self, records: &[TaskRecord]) -> task_manager_rs::Result<()> {
        sleep(self.save_delay).await;
        self.inner.save(records).await
    }

    async fn health_check(&self) -> bool {
        true
    }
}

async fn store_with(names: &[&str]) -> (TaskStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = TaskStore::open(backend.clone()).await;
    for name in names {
        store.append(TaskFields::new(*name, "medium")).await.unwrap();
    }
    (store, backend)
}

fn names(records: &[TaskRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn test_append_assigns_next_index() {
    let (store, _backend) = store_with(&["a", "b"]).await;

    let (index, task) = store.append(TaskFields::new("c", "high")).await.unwrap();

    assert_eq!(index, 2);
    assert_eq!(store.get(2).await.unwrap(), task);
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn test_append_rejects_missing_fields() {
    let (store, _backend) = store_with(&[]).await;

    let result = store.append(TaskFields::default()).await;

    assert!(matches!(
        result,
        Err(TaskManagerError::MissingRequiredField(_))
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_get_out_of_range() {
    let (store, _backend) = store_with(&["a", "b"]).await;

    assert!(matches!(
        store.get(2).await,
        Err(TaskManagerError::IndexOutOfRange(2))
    ));
    assert!(matches!(
        store.get(-1).await,
        Err(TaskManagerError::IndexOutOfRange(-1))
    ));
}

#[tokio::test]
async fn test_remove_shifts_later_indices() {
    let (store, _backend) = store_with(&["a", "b", "c", "d"]).await;

    let removed = store.remove(1).await.unwrap();

    assert_eq!(removed.name, "b");
    assert_eq!(store.len().await, 3);
    assert_eq!(names(&store.list().await), vec!["a", "c", "d"]);
    assert_eq!(store.get(1).await.unwrap().name, "c");
}

#[tokio::test]
async fn test_remove_each_valid_index() {
    for index in 0..3 {
        let (store, _backend) = store_with(&["a", "b", "c"]).await;
        let before = store.list().await;

        store.remove(index).await.unwrap();

        let mut expected = before.clone();
        expected.remove(index as usize);
        assert_eq!(store.list().await, expected);
    }
}

#[tokio::test]
async fn test_update_overwrites_instead_of_merging() {
    let (store, _backend) = store_with(&[]).await;
    store
        .append(
            TaskFields::new("a", "low")
                .with_deadline("2025-01-01")
                .with_details("notes"),
        )
        .await
        .unwrap();
    store.set_completed(0, true).await.unwrap();

    let updated = store.update(0, TaskFields::new("b", "high")).await.unwrap();

    assert_eq!(updated.name, "b");
    assert_eq!(updated.priority, "high");
    assert_eq!(updated.deadline, "");
    assert_eq!(updated.details, "");
    assert!(updated.completed);
}

#[tokio::test]
async fn test_update_sets_completed_when_supplied() {
    let (store, _backend) = store_with(&["a"]).await;
    store.set_completed(0, true).await.unwrap();

    let updated = store
        .update(0, TaskFields::new("a", "low").with_completed(false))
        .await
        .unwrap();

    assert!(!updated.completed);
}

#[tokio::test]
async fn test_update_out_of_range_leaves_store_unchanged() {
    let (store, backend) = store_with(&["a", "b"]).await;
    let before = store.list().await;
    let document = backend.document().await;

    let result = store.update(5, TaskFields::new("x", "low")).await;

    assert!(matches!(result, Err(TaskManagerError::IndexOutOfRange(5))));
    assert_eq!(store.list().await, before);
    assert_eq!(backend.document().await, document);
}

#[tokio::test]
async fn test_update_missing_field_leaves_store_unchanged() {
    let (store, _backend) = store_with(&["a"]).await;
    let before = store.list().await;
    let fields = TaskFields {
        name: Some("x".to_string()),
        ..Default::default()
    };

    assert!(store.update(0, fields).await.is_err());
    assert_eq!(store.list().await, before);
}

#[tokio::test]
async fn test_mutations_write_through() {
    let (store, backend) = store_with(&["a", "b"]).await;
    assert_eq!(backend.load().await.unwrap(), store.list().await);

    store.set_completed(1, true).await.unwrap();
    assert_eq!(backend.load().await.unwrap(), store.list().await);

    store.update(0, TaskFields::new("z", "low")).await.unwrap();
    assert_eq!(backend.load().await.unwrap(), store.list().await);

    store.remove(0).await.unwrap();
    let persisted = backend.load().await.unwrap();
    assert_eq!(persisted, store.list().await);
    assert_eq!(names(&persisted), vec!["b"]);
}

#[tokio::test]
async fn test_open_loads_existing_file_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    {
        let store = TaskStore::open(Arc::new(JsonFileBackend::new(&path))).await;
        for name in ["first", "second", "third"] {
            store.append(TaskFields::new(name, "low")).await.unwrap();
        }
    }

    let reopened = TaskStore::open(Arc::new(JsonFileBackend::new(&path))).await;

    assert_eq!(
        names(&reopened.list().await),
        vec!["first", "second", "third"]
    );
}

#[tokio::test]
async fn test_open_creates_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");

    let store = TaskStore::open(Arc::new(JsonFileBackend::new(&path))).await;

    assert!(store.is_empty().await);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
}

#[tokio::test]
async fn test_open_malformed_file_starts_empty() {
    let backend = Arc::new(MemoryBackend::with_document("[{"));

    let store = TaskStore::open(backend).await;

    assert!(store.is_empty().await);
    store.append(TaskFields::new("a", "low")).await.unwrap();
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_reload_picks_up_external_changes() {
    let backend = Arc::new(MemoryBackend::new());
    let store = TaskStore::open(backend.clone()).await;

    backend
        .save(&[TaskRecord::new("external", "high")])
        .await
        .unwrap();
    let count = store.reload().await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(store.get(0).await.unwrap().name, "external");
}

#[tokio::test]
async fn test_failed_save_keeps_mutation() {
    let dir = TempDir::new().unwrap();
    // Saving onto a directory always fails
    let store = TaskStore::new(Arc::new(JsonFileBackend::new(dir.path())));

    let (index, _) = store.append(TaskFields::new("a", "low")).await.unwrap();

    assert_eq!(index, 0);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_strict_persistence_reports_failed_save() {
    let dir = TempDir::new().unwrap();
    let store = TaskStore::new(Arc::new(JsonFileBackend::new(dir.path())))
        .with_strict_persistence(true);

    let result = store.append(TaskFields::new("a", "low")).await;

    assert!(matches!(
        result,
        Err(TaskManagerError::PersistenceWriteFailure(_))
    ));
    // The in-memory change still stands
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_dropped_append_still_persists() {
    let backend = Arc::new(SlowBackend::new(Duration::from_millis(50)));
    let store = TaskStore::open(backend.clone()).await;

    let result = timeout(
        Duration::from_millis(5),
        store.append(TaskFields::new("a", "low")),
    )
    .await;
    assert!(result.is_err(), "append should still be saving");

    sleep(Duration::from_millis(150)).await;

    let memory = store.list().await;
    assert_eq!(memory.len(), 1);
    assert_eq!(backend.load().await.unwrap(), memory);
}

#[tokio::test]
async fn test_dropped_mutations_are_saved_in_order() {
    let backend = Arc::new(SlowBackend::new(Duration::from_millis(20)));
    let store = TaskStore::open(backend.clone()).await;

    for name in ["a", "b", "c"] {
        let _ = timeout(
            Duration::from_millis(1),
            store.append(TaskFields::new(name, "low")),
        )
        .await;
    }
    store.remove(0).await.unwrap();

    let memory = store.list().await;
    assert_eq!(names(&memory), vec!["b", "c"]);
    assert_eq!(backend.load().await.unwrap(), memory);
}

#[tokio::test]
async fn test_reload_failure_clears_store() {
    let backend = Arc::new(SlowBackend::new(Duration::ZERO));
    let store = TaskStore::open(backend.clone()).await;
    store.append(TaskFields::new("a", "low")).await.unwrap();

    backend.fail_setup.store(true, Ordering::SeqCst);

    assert!(store.reload().await.is_err());
    assert!(store.is_empty().await);
}
