use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::{domain::errors::StorageResult, ports::storage::ByteStream};

/// Port for the local scratch area used to materialize content before upload
#[async_trait]
pub trait ScratchSpace: Send + Sync + 'static {
    /// Create a uniquely named artifact holding exactly `content`.
    /// The write is flushed to durable storage before this returns.
    async fn stage(&self, content: Bytes) -> StorageResult<Box<dyn StagedArtifact>>;
}

/// A written scratch artifact. Dropping it removes the backing resource.
#[async_trait]
pub trait StagedArtifact: Send + Sync {
    /// Location of the artifact, for diagnostics
    fn path(&self) -> &Path;

    /// Size in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reopen the artifact for reading
    async fn open(&self) -> StorageResult<ByteStream>;
}
