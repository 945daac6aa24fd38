use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tokio_util::io::ReaderStream;

use crate::{
    domain::errors::{StorageError, StorageResult},
    ports::storage::{ByteStream, ScratchSpace, StagedArtifact},
};

/// Scratch space backed by uniquely named files in a local directory
#[derive(Debug, Clone)]
pub struct TempDirScratch {
    dir: PathBuf,
}

impl TempDirScratch {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ScratchSpace for TempDirScratch {
    async fn stage(&self, content: Bytes) -> StorageResult<Box<dyn StagedArtifact>> {
        let dir = self.dir.clone();
        let len = content.len() as u64;

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix("combined-")
                .suffix(".txt")
                .tempfile_in(&dir)?;
            file.write_all(&content)?;
            file.as_file().sync_all()?;
            Ok(file)
        })
        .await
        .map_err(|e| StorageError::Io {
            message: format!("Staging task failed: {}", e),
        })??;

        Ok(Box::new(TempFileArtifact { file, len }))
    }
}

/// A staged file; deleted when dropped
struct TempFileArtifact {
    file: NamedTempFile,
    len: u64,
}

#[async_trait]
impl StagedArtifact for TempFileArtifact {
    fn path(&self) -> &Path {
        self.file.path()
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn open(&self) -> StorageResult<ByteStream> {
        let file = tokio::fs::File::open(self.file.path()).await?;

        Ok(ReaderStream::new(file)
            .map(|chunk| chunk.map_err(StorageError::from))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::storage::collect_bytes;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn stage_then_reopen_returns_content() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = TempDirScratch::new(dir.path());

        let artifact = scratch.stage(Bytes::from("a\nb\n")).await.unwrap();

        assert_eq!(artifact.len(), 4);
        assert!(artifact.path().starts_with(dir.path()));
        let body = artifact.open().await.unwrap();
        assert_eq!(collect_bytes(body).await.unwrap(), b"a\nb\n");
    }

    #[tokio::test]
    async fn artifact_can_be_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = TempDirScratch::new(dir.path());
        let artifact = scratch.stage(Bytes::from("same")).await.unwrap();

        let first = collect_bytes(artifact.open().await.unwrap()).await.unwrap();
        let second = collect_bytes(artifact.open().await.unwrap()).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn dropping_artifact_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = TempDirScratch::new(dir.path());

        let artifact = scratch.stage(Bytes::new()).await.unwrap();
        assert!(artifact.is_empty());
        assert_eq!(entries(dir.path()), 1);

        drop(artifact);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = TempDirScratch::new(dir.path().join("does-not-exist"));

        let result = scratch.stage(Bytes::from("x")).await;

        assert!(matches!(result, Err(StorageError::Io { .. })));
    }
}
