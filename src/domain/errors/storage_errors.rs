use crate::domain::value_objects::{BucketName, ObjectKey};

/// Errors reported by the storage backend and scratch space
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Object not found
    ObjectNotFound { key: ObjectKey },

    /// Bucket not found or not reachable with the configured credentials
    BucketNotFound { bucket: BucketName },

    /// Access denied
    AccessDenied { key: String, operation: String },

    /// Validation error
    ValidationError { message: String },

    /// Unsupported operation
    UnsupportedOperation { operation: String, reason: String },

    /// Local I/O failure (scratch artifact, body stream)
    Io { message: String },

    /// Infrastructure error with external source
    InfrastructureError {
        message: String,
        source: Option<String>, // Store error as string to allow Clone
    },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ObjectNotFound { key } => {
                write!(f, "Object not found: {}", key)
            }
            StorageError::BucketNotFound { bucket } => {
                write!(f, "Bucket not found: {}", bucket)
            }
            StorageError::AccessDenied { key, operation } => {
                write!(
                    f,
                    "Access denied for operation '{}' on object: {}",
                    operation, key
                )
            }
            StorageError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            StorageError::UnsupportedOperation { operation, reason } => {
                write!(f, "Unsupported operation '{}': {}", operation, reason)
            }
            StorageError::Io { message } => write!(f, "IO error: {}", message),
            StorageError::InfrastructureError { message, .. } => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
