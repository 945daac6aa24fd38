use crate::domain::{errors::StorageError, value_objects::ObjectKey};

/// Convert object_store errors to domain storage errors
impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { ref path, .. } => match ObjectKey::new(path.as_str()) {
                Ok(key) => StorageError::ObjectNotFound { key },
                Err(_) => StorageError::ValidationError {
                    message: format!("Invalid object path from store: {}", path),
                },
            },
            object_store::Error::PermissionDenied { ref path, .. }
            | object_store::Error::Unauthenticated { ref path, .. } => {
                StorageError::AccessDenied {
                    key: path.clone(),
                    operation: err.to_string(),
                }
            }
            object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
                StorageError::UnsupportedOperation {
                    operation: "unknown".to_string(),
                    reason: err.to_string(),
                }
            }
            _ => StorageError::InfrastructureError {
                message: format!("Object store operation failed: {}", err),
                source: Some(err.to_string()),
            },
        }
    }
}

/// Keys that cannot be expressed as an object_store path
impl From<object_store::path::Error> for StorageError {
    fn from(err: object_store::path::Error) -> Self {
        StorageError::ValidationError {
            message: format!("Key is not a valid object path: {}", err),
        }
    }
}

/// Convert standard io::Error to domain errors
impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => StorageError::AccessDenied {
                key: "scratch".to_string(),
                operation: err.to_string(),
            },
            _ => StorageError::Io {
                message: err.to_string(),
            },
        }
    }
}
