//! Route handlers for the task API.

use super::AppState;
use crate::task::TaskFields;
use crate::TaskManagerError;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

impl IntoResponse for TaskManagerError {
    fn into_response(self) -> Response {
        let status = match &self {
            TaskManagerError::MalformedRequestBody(_)
            | TaskManagerError::MissingRequiredField(_)
            | TaskManagerError::IndexOutOfRange(_)
            | TaskManagerError::InvalidIndex(_) => {
                warn!("Rejected request: {}", self);
                StatusCode::BAD_REQUEST
            }
            _ => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// `GET /tasks`
pub async fn list_tasks(State(state): State<AppState>) -> Json<Value> {
    let tasks = state.store.list().await;
    debug!("Returning {} tasks", tasks.len());
    Json(json!({ "tasks": tasks }))
}

/// `POST /add_task`
pub async fn add_task(State(state): State<AppState>, body: Bytes) -> crate::Result<Json<Value>> {
    let fields = TaskFields::from_json(&body)?;
    let (index, task) = state.store.append(fields).await?;
    Ok(Json(json!({
        "message": "Task added successfully",
        "task_index": index,
        "task": task,
    })))
}

/// `POST /update_task/{index}`
pub async fn update_task(
    State(state): State<AppState>,
    Path(index): Path<String>,
    body: Bytes,
) -> crate::Result<Json<Value>> {
    let index = parse_index(&index)?;
    // Index problems are reported ahead of body problems
    state.store.get(index).await?;
    let fields = TaskFields::from_json(&body)?;
    let task = state.store.update(index, fields).await?;
    Ok(Json(json!({
        "message": "Task updated successfully",
        "task": task,
    })))
}

/// `GET /complete_task/{index}`
pub async fn complete_task(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> crate::Result<&'static str> {
    let index = parse_index(&index)?;
    state.store.set_completed(index, true).await?;
    Ok("Task completed.")
}

/// `GET /delete_task/{index}`
pub async fn delete_task(
    State(state): State<AppState>,
    Path(index): Path<String>,
) -> crate::Result<&'static str> {
    let index = parse_index(&index)?;
    state.store.remove(index).await?;
    Ok("Task deleted.")
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.store.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        info!("Health check failed: storage unavailable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded" })),
        )
    }
}

fn parse_index(raw: &str) -> crate::Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| TaskManagerError::InvalidIndex(raw.to_string()))
}
