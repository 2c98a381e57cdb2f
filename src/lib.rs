//! Task Manager RS - a small HTTP task list service
//!
//! This library keeps an ordered list of tasks in memory, writes every change
//! through to a JSON file on disk and exposes the list over a JSON HTTP API.

/// Configuration management for the service
pub mod config;
/// HTTP routing and request handlers
pub mod server;
/// Persistence backends for the task list
pub mod storage;
/// The shared, ordered task store
pub mod store;
/// Task record definitions
pub mod task;

pub use crate::config::Config;
pub use store::TaskStore;
pub use task::{TaskFields, TaskRecord};

use thiserror::Error;

/// Result type for task manager operations
pub type Result<T> = std::result::Result<T, TaskManagerError>;

/// Error types for the task manager
#[derive(Error, Debug)]
pub enum TaskManagerError {
    /// Request payload is not parseable JSON or has a field of the wrong type
    #[error("Invalid JSON: {0}")]
    MalformedRequestBody(String),

    /// A required field was absent on create/update
    #[error("Required field missing: {0}")]
    MissingRequiredField(&'static str),

    /// Referenced task index is negative or past the end of the list
    #[error("Invalid task index: {0}")]
    IndexOutOfRange(i64),

    /// Index path segment is not an integer
    #[error("Invalid task index: {0}")]
    InvalidIndex(String),

    /// Persistence file could not be read or parsed
    #[error("Failed to read tasks: {0}")]
    PersistenceReadFailure(String),

    /// Persistence file could not be written
    #[error("Failed to write tasks: {0}")]
    PersistenceWriteFailure(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A store operation's task panicked before finishing
    #[error("Store operation aborted: {0}")]
    OperationAborted(String),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
