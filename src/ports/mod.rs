pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use services::AggregationService;
pub use storage::{ByteStream, ObjectInfo, ObjectStore, ScratchSpace, StagedArtifact};
