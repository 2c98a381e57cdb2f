//! Task Manager RS binary entry point

use std::sync::Arc;
use task_manager_rs::config::{Config, StorageBackend};
use task_manager_rs::server;
use task_manager_rs::storage::backend::{JsonFileBackend, MemoryBackend};
use task_manager_rs::TaskStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config resolution logs at INFO before the configured level is known
    let bootstrap = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    let config = tracing::subscriber::with_default(bootstrap, Config::load)?;
    config.validate()?;

    // Initialize tracing
    let level: Level = config.log_level.parse()?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting Task Manager RS");
    info!("Initialized with {} workers", config.worker_count);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_count)
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn task_manager_rs::storage::StorageBackend> = match config.storage_backend
    {
        StorageBackend::File => {
            let file = JsonFileBackend::new(&config.tasks_file);
            info!("Persisting tasks to {}", file.path().display());
            Arc::new(file)
        }
        StorageBackend::Memory => {
            info!("Keeping tasks in memory only");
            Arc::new(MemoryBackend::new())
        }
    };

    let store = TaskStore::open(backend)
        .await
        .with_strict_persistence(config.strict_persistence);
    if !store.health_check().await {
        tracing::warn!("Task storage is not healthy, changes may not be persisted");
    }

    let router = server::build_router(Arc::new(store), &config.frontend_dir);
    server::serve(&config.bind_address(), router).await?;

    info!("Task Manager RS stopped");
    Ok(())
}
