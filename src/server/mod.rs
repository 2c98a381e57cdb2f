//! HTTP server built on axum.

/// Route handlers
pub mod routes;

use crate::store::TaskStore;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
}

/// Build the router: the task API, CORS on the listing, and the front-end
/// directory as fallback for every other path.
pub fn build_router(store: Arc<TaskStore>, frontend_dir: impl AsRef<Path>) -> Router {
    let state = AppState { store };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let listing = Router::new()
        .route("/tasks", get(routes::list_tasks))
        .layer(cors);

    Router::new()
        .route("/add_task", post(routes::add_task))
        .route("/update_task/{index}", post(routes::update_task))
        .route("/complete_task/{index}", get(routes::complete_task))
        .route("/delete_task/{index}", get(routes::delete_task))
        .route("/health", get(routes::health))
        .merge(listing)
        .fallback_service(ServeDir::new(frontend_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve `router` until Ctrl-C
pub async fn serve(addr: &str, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Task manager listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, stopping server");
    }
}
