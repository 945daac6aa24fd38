use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};

use crate::domain::{
    errors::StorageResult,
    value_objects::{BucketName, ObjectKey},
};

/// Chunked object body. Dropping the stream releases the underlying
/// connection or file handle.
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Port for object storage operations.
/// This abstracts the actual storage backend (S3, MinIO, in-memory, ...).
/// Implementations are shared read-only across invocations.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// List every object whose key starts with `prefix`, in backend order.
    /// Paginated backends must be drained until the listing is exhausted.
    async fn list_objects(
        &self,
        bucket: &BucketName,
        prefix: &str,
    ) -> StorageResult<Vec<ObjectInfo>>;

    /// Open an object's body for streaming
    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<ByteStream>;

    /// Store an object, consuming `body` completely before it is committed
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: ByteStream,
        content_type: Option<&str>,
    ) -> StorageResult<()>;
}

/// Information about an object in storage
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: ObjectKey,
    pub size: u64,
    pub etag: Option<String>,
}

/// Wrap an in-memory buffer as a single-chunk body
pub fn bytes_stream(data: impl Into<Bytes>) -> ByteStream {
    let data = data.into();
    stream::once(async move { Ok(data) }).boxed()
}

/// Drain a body into one contiguous buffer
pub async fn collect_bytes(mut body: ByteStream) -> StorageResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf)
}
