/// Backend implementations
pub mod backend;

use crate::task::TaskRecord;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

/// Trait for task list persistence
///
/// A backend always stores the whole list; there is no per-record write.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Create an empty task list if nothing is stored yet. Never overwrites.
    async fn ensure_exists(&self) -> crate::Result<()>;

    /// Load the stored task list
    async fn load(&self) -> crate::Result<Vec<TaskRecord>>;

    /// Replace the stored task list with `records`
    async fn save(&self, records: &[TaskRecord]) -> crate::Result<()>;

    /// Check if storage is usable
    async fn health_check(&self) -> bool;
}

/// Serialize the full list as a pretty-printed JSON array
pub fn encode_records(records: &[TaskRecord]) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parse a stored JSON array into task records.
///
/// Elements without a string `name` and `priority` are skipped. A document
/// that is not valid JSON, or whose top level is not an array, is an error.
pub fn decode_records(contents: &str) -> crate::Result<Vec<TaskRecord>> {
    let value: Value = serde_json::from_str(contents).map_err(|e| {
        crate::TaskManagerError::PersistenceReadFailure(format!("invalid JSON: {e}"))
    })?;

    let Value::Array(items) = value else {
        return Err(crate::TaskManagerError::PersistenceReadFailure(
            "top-level value is not an array".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match decode_record(item) {
            Ok(record) => records.push(record),
            Err(reason) => warn!("Skipping stored task at position {}: {}", position, reason),
        }
    }
    Ok(records)
}

fn decode_record(item: &Value) -> std::result::Result<TaskRecord, &'static str> {
    let object = item.as_object().ok_or("not a JSON object")?;
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or("missing name")?;
    let priority = object
        .get("priority")
        .and_then(Value::as_str)
        .ok_or("missing priority")?;

    // null, absent and non-string values all read as empty
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(TaskRecord {
        name: name.to_string(),
        completed: object
            .get("completed")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        priority: priority.to_string(),
        deadline: text("deadline"),
        details: text("details"),
    })
}
