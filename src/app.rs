use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing_subscriber::filter::LevelFilter;

use crate::{
    adapters::{
        inbound::lambda::{InvocationHandler, DEFAULT_DEADLINE_MARGIN},
        outbound::{
            scratch::TempDirScratch,
            storage::{s3_adapter, ApacheObjectStoreAdapter, S3Config},
        },
    },
    ports::storage::{ObjectStore, ScratchSpace},
    services::{AggregationServiceBuilder, AggregationServiceImpl},
};

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    /// Directory for staged artifacts
    pub scratch_dir: PathBuf,
    /// Time reserved before the invocation deadline
    pub deadline_margin: Duration,
    pub log_level: LevelFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::InMemory,
            scratch_dir: std::env::temp_dir(),
            deadline_margin: DEFAULT_DEADLINE_MARGIN,
            log_level: LevelFilter::INFO,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    S3 {
        region: String,
        endpoint: Option<String>,
        access_key: Option<String>,
        secret_key: Option<String>,
    },
    MinIO {
        endpoint: String,
        access_key: String,
        secret_key: String,
        use_ssl: bool,
    },
}

impl StorageBackend {
    /// Backend name, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            StorageBackend::InMemory => "memory",
            StorageBackend::S3 { .. } => "s3",
            StorageBackend::MinIO { .. } => "minio",
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| AppError::Configuration {
                message: format!("{} environment variable required", name),
            })
        };

        // Unset means the ambient AWS environment of the function.
        let storage_backend = match lookup("STORAGE_BACKEND").as_deref() {
            Some("memory") => StorageBackend::InMemory,
            None | Some("s3") => StorageBackend::S3 {
                region: lookup("S3_REGION")
                    .or_else(|| lookup("AWS_REGION"))
                    .unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: lookup("S3_ENDPOINT"),
                access_key: lookup("S3_ACCESS_KEY"),
                secret_key: lookup("S3_SECRET_KEY"),
            },
            Some("minio") => StorageBackend::MinIO {
                endpoint: required("MINIO_ENDPOINT")?,
                access_key: required("MINIO_ACCESS_KEY")?,
                secret_key: required("MINIO_SECRET_KEY")?,
                use_ssl: lookup("MINIO_USE_SSL")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(false),
            },
            Some(other) => {
                return Err(AppError::Configuration {
                    message: format!("Unknown storage backend: {}", other),
                })
            }
        };

        let scratch_dir = lookup("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let deadline_margin = match lookup("DEADLINE_MARGIN_MS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| AppError::Configuration {
                    message: format!("Invalid DEADLINE_MARGIN_MS '{}': {}", value, e),
                })?,
            None => DEFAULT_DEADLINE_MARGIN,
        };

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => value
                .to_lowercase()
                .parse::<LevelFilter>()
                .map_err(|e| AppError::Configuration {
                    message: format!("Invalid LOG_LEVEL '{}': {}", value, e),
                })?,
            None => LevelFilter::INFO,
        };

        Ok(Self {
            storage_backend,
            scratch_dir,
            deadline_margin,
            log_level,
        })
    }
}

/// Application dependencies container
pub struct AppDependencies {
    pub object_store: Arc<dyn ObjectStore>,
    pub scratch: Arc<dyn ScratchSpace>,
}

/// Application services container
pub struct AppServices {
    pub aggregation_service: AggregationServiceImpl,
    /// The store the service reads from and writes to
    pub object_store: Arc<dyn ObjectStore>,
}

impl AppServices {
    /// Invocation handler around the aggregation service
    pub fn invocation_handler(&self, deadline_margin: Duration) -> InvocationHandler {
        InvocationHandler::new(Arc::new(self.aggregation_service.clone()))
            .with_deadline_margin(deadline_margin)
    }
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    /// Configure scratch directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = dir.into();
        self
    }

    /// Build the application dependencies
    pub async fn build_dependencies(self) -> Result<AppDependencies, AppError> {
        let object_store = self.create_object_store();
        let scratch = self.create_scratch().await?;

        Ok(AppDependencies {
            object_store,
            scratch,
        })
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        let deps = self.build_dependencies().await?;

        let aggregation_service = AggregationServiceBuilder::new()
            .store(deps.object_store.clone())
            .scratch(deps.scratch.clone())
            .build()
            .map_err(|message| AppError::ServiceInit {
                message: message.to_string(),
            })?;

        Ok(AppServices {
            aggregation_service,
            object_store: deps.object_store,
        })
    }

    fn create_object_store(&self) -> Arc<dyn ObjectStore> {
        match &self.config.storage_backend {
            StorageBackend::InMemory => Arc::new(ApacheObjectStoreAdapter::in_memory()),
            StorageBackend::S3 {
                region,
                endpoint,
                access_key,
                secret_key,
            } => Arc::new(s3_adapter(S3Config {
                region: region.clone(),
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                endpoint: endpoint.clone(),
                allow_http: false,
            })),
            StorageBackend::MinIO {
                endpoint,
                access_key,
                secret_key,
                use_ssl,
            } => Arc::new(s3_adapter(S3Config {
                region: "us-east-1".to_string(),
                access_key: Some(access_key.clone()),
                secret_key: Some(secret_key.clone()),
                endpoint: Some(endpoint.clone()),
                allow_http: !use_ssl,
            })),
        }
    }

    async fn create_scratch(&self) -> Result<Arc<dyn ScratchSpace>, AppError> {
        let dir = &self.config.scratch_dir;
        let metadata = tokio::fs::metadata(dir)
            .await
            .map_err(|e| AppError::StorageInit {
                message: format!("Scratch directory {} unavailable: {}", dir.display(), e),
            })?;

        if !metadata.is_dir() {
            return Err(AppError::StorageInit {
                message: format!("Scratch path {} is not a directory", dir.display()),
            });
        }

        Ok(Arc::new(TempDirScratch::new(dir.clone())))
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },

    #[error("Service initialization error: {message}")]
    ServiceInit { message: String },
}

/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
        .await
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_config(AppConfig::from_env()?)
        .build()
        .await
}
