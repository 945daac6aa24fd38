use thiserror::Error as ThisError;

use crate::domain::{
    errors::{StorageError, ValidationError},
    models::Stage,
    value_objects::{BucketName, ObjectKey},
};

/// Fatal failures of an aggregation run. Any of these aborts the run before
/// the combined object is written.
#[derive(ThisError, Debug)]
pub enum AggregateError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("failed to list objects in bucket {bucket} with prefix {prefix:?}: {source}")]
    Listing {
        bucket: BucketName,
        prefix: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to get object {key} from bucket {bucket}: {source}")]
    Fetch {
        bucket: BucketName,
        key: ObjectKey,
        #[source]
        source: StorageError,
    },

    #[error("failed to stage combined content: {source}")]
    Staging {
        #[source]
        source: StorageError,
    },

    #[error("failed to upload combined content to {bucket}/{key}: {source}")]
    Upload {
        bucket: BucketName,
        key: ObjectKey,
        #[source]
        source: StorageError,
    },

    #[error("aggregation cancelled while {stage}")]
    Cancelled { stage: Stage },
}

impl AggregateError {
    /// The pipeline stage the run failed in
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AggregateError::InvalidRequest(_) => None,
            AggregateError::Listing { .. } => Some(Stage::Listing),
            AggregateError::Fetch { .. } => Some(Stage::Fetching),
            AggregateError::Staging { .. } => Some(Stage::Staging),
            AggregateError::Upload { .. } => Some(Stage::Uploading),
            AggregateError::Cancelled { stage } => Some(*stage),
        }
    }
}

/// A body read that failed after the object was opened. Reported and
/// skipped; the bytes read before the failure stay in the output.
#[derive(ThisError, Debug, Clone)]
#[error("failed to read object {key} after {bytes_copied} bytes: {source}")]
pub struct CopyError {
    pub key: ObjectKey,
    pub bytes_copied: u64,
    #[source]
    pub source: StorageError,
}
