//! Configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration for the task manager service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the HTTP listener to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// JSON file holding the task list
    pub tasks_file: PathBuf,

    /// Directory the front-end assets are served from
    pub frontend_dir: PathBuf,

    /// Number of runtime worker threads handling requests
    pub worker_count: usize,

    /// Storage backend type
    pub storage_backend: StorageBackend,

    /// Fail mutating requests when the task file cannot be written
    pub strict_persistence: bool,

    /// Maximum log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Storage backend types supported by the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file on disk
    #[serde(alias = "json")]
    File,
    /// In-memory storage (non-persistent)
    Memory,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tasks_file: PathBuf::from("tasks.json"),
            frontend_dir: PathBuf::from("frontend"),
            worker_count: num_cpus(),
            storage_backend: StorageBackend::File,
            strict_persistence: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment variables, or defaults
    pub fn load() -> crate::Result<Self> {
        // Try to load from config file specified in environment variable
        if let Ok(config_path) = env::var("TASK_MANAGER_CONFIG") {
            info!("Loading config from TASK_MANAGER_CONFIG: {}", config_path);
            return Self::from_file(&config_path);
        }

        let default_paths = [
            "config.yaml",
            "config.toml",
            "config/config.yaml",
            "config/config.toml",
        ];

        for path in default_paths {
            if Path::new(path).exists() {
                info!("Loading config from: {}", path);
                return Self::from_file(path);
            }
        }

        if let Ok(config) = Self::from_env() {
            info!("Loaded config from environment variables");
            return Ok(config);
        }

        warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .map_err(|e| {
                crate::TaskManagerError::ConfigError(format!("Failed to load config file: {}", e))
            })?;

        let config: Config = settings.try_deserialize().map_err(|e| {
            crate::TaskManagerError::ConfigError(format!("Failed to parse config: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        let mut found_any = false;

        if let Ok(val) = env::var("TASK_MANAGER_HOST") {
            config.host = val;
            found_any = true;
        }

        if let Ok(val) = env::var("TASK_MANAGER_PORT") {
            config.port = val.parse().map_err(|e| {
                crate::TaskManagerError::ConfigError(format!("Invalid PORT: {}", e))
            })?;
            found_any = true;
        }

        if let Ok(val) = env::var("TASK_MANAGER_TASKS_FILE") {
            config.tasks_file = PathBuf::from(val);
            found_any = true;
        }

        if let Ok(val) = env::var("TASK_MANAGER_FRONTEND_DIR") {
            config.frontend_dir = PathBuf::from(val);
            found_any = true;
        }

        if let Ok(val) = env::var("TASK_MANAGER_WORKER_COUNT") {
            config.worker_count = val.parse().map_err(|e| {
                crate::TaskManagerError::ConfigError(format!("Invalid WORKER_COUNT: {}", e))
            })?;
            found_any = true;
        }

        if let Ok(val) = env::var("TASK_MANAGER_STORAGE_BACKEND") {
            config.storage_backend = match val.to_lowercase().as_str() {
                "file" | "json" => StorageBackend::File,
                "memory" => StorageBackend::Memory,
                _ => {
                    return Err(crate::TaskManagerError::ConfigError(format!(
                        "Invalid STORAGE_BACKEND: {}",
                        val
                    )))
                }
            };
            found_any = true;
        }

        if let Ok(val) = env::var("TASK_MANAGER_STRICT_PERSISTENCE") {
            config.strict_persistence = val.parse().map_err(|e| {
                crate::TaskManagerError::ConfigError(format!("Invalid STRICT_PERSISTENCE: {}", e))
            })?;
            found_any = true;
        }

        if let Ok(val) = env::var("TASK_MANAGER_LOG_LEVEL") {
            config.log_level = val;
            found_any = true;
        }

        if !found_any {
            return Err(crate::TaskManagerError::ConfigError(
                "No environment variables found".to_string(),
            ));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.worker_count == 0 {
            return Err(crate::TaskManagerError::ConfigError(
                "Worker count must be greater than 0".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(crate::TaskManagerError::ConfigError(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.tasks_file.as_os_str().is_empty() {
            return Err(crate::TaskManagerError::ConfigError(
                "Tasks file path must not be empty".to_string(),
            ));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(crate::TaskManagerError::ConfigError(format!(
                "Unknown log level: {}",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Socket address string the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
