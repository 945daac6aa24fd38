//! S3 and S3-compatible (MinIO) backends built on the object_store crate

use anyhow::{Context, Result};
use object_store::{aws::AmazonS3Builder, ObjectStore as ObjectStoreBackend};
use std::sync::Arc;

use super::ApacheObjectStoreAdapter;
use crate::domain::{errors::StorageError, value_objects::BucketName};

/// Connection settings shared by every bucket the process touches
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint: Option<String>,
    pub allow_http: bool,
}

/// Create an S3 store for one bucket.
///
/// Settings not given in `config` (session token, container credentials)
/// are picked up from the standard `AWS_*` environment variables.
pub fn create_s3_store(config: &S3Config, bucket: &BucketName) -> Result<Arc<dyn ObjectStoreBackend>> {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(bucket.as_str())
        .with_region(&config.region)
        .with_allow_http(config.allow_http);

    if let Some(access_key) = &config.access_key {
        builder = builder.with_access_key_id(access_key);
    }

    if let Some(secret_key) = &config.secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }

    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
    }

    let store = builder
        .build()
        .with_context(|| format!("Failed to build S3 store for bucket {}", bucket))?;

    Ok(Arc::new(store))
}

/// Adapter that lazily opens one S3 handle per bucket from shared settings
pub fn s3_adapter(config: S3Config) -> ApacheObjectStoreAdapter {
    ApacheObjectStoreAdapter::new(move |bucket| {
        create_s3_store(&config, bucket).map_err(|e| StorageError::InfrastructureError {
            message: format!("{:#}", e),
            source: Some(e.root_cause().to_string()),
        })
    })
}
