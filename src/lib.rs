pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - requests, results and errors
pub use domain::{
    AggregateError, AggregateOutput, AggregateRequest, BucketName, CopyError, ObjectKey, Stage,
    StorageError, ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{AggregationService, ByteStream, ObjectInfo, ObjectStore, ScratchSpace, StagedArtifact};

// Service implementations - business logic
pub use services::{AggregationServiceBuilder, AggregationServiceImpl, COMBINED_CONTENT_TYPE};

// Application factory and configuration
pub use app::{
    create_app_from_env, create_in_memory_app, AppBuilder, AppConfig, AppDependencies, AppError,
    AppServices, StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::{
    inbound::lambda::{InvocationHandler, InvocationPayloadDto},
    outbound::{
        scratch::TempDirScratch,
        storage::{ApacheObjectStoreAdapter, S3Config},
    },
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_in_memory_app, AggregateRequest, AggregationService, AggregationServiceImpl,
        ApacheObjectStoreAdapter, AppBuilder, AppServices, BucketName, InvocationHandler,
        ObjectKey, ObjectStore, TempDirScratch,
    };
    pub use tokio_util::sync::CancellationToken;
}
