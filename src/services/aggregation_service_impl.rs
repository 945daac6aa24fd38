use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::{AggregateError, CopyError, StorageError},
        models::{AggregateOutput, AggregateRequest, Stage},
        value_objects::ObjectKey,
    },
    ports::{
        services::AggregationService,
        storage::{ByteStream, ObjectStore, ScratchSpace, StagedArtifact},
    },
};

/// Content type of the combined object
pub const COMBINED_CONTENT_TYPE: &str = "text/plain";

const SEPARATOR: u8 = b'\n';

/// Sequential list/fetch/concatenate/stage/upload pipeline
#[derive(Clone)]
pub struct AggregationServiceImpl {
    store: Arc<dyn ObjectStore>,
    scratch: Arc<dyn ScratchSpace>,
}

/// Everything read from the store for one run
struct Collected {
    bytes: Vec<u8>,
    objects: usize,
    copy_failures: Vec<CopyError>,
}

impl AggregationServiceImpl {
    /// Create a new AggregationServiceImpl instance
    pub fn new(store: Arc<dyn ObjectStore>, scratch: Arc<dyn ScratchSpace>) -> Self {
        Self { store, scratch }
    }

    async fn collect(
        &self,
        request: &AggregateRequest,
        cancel: &CancellationToken,
    ) -> Result<Collected, AggregateError> {
        let mut collected = Collected {
            bytes: Vec::new(),
            objects: 0,
            copy_failures: Vec::new(),
        };

        for prefix in &request.prefixes {
            let listing = until_cancelled(
                cancel,
                Stage::Listing,
                self.store.list_objects(&request.bucket, prefix),
            )
            .await?
            .map_err(|source| AggregateError::Listing {
                bucket: request.bucket.clone(),
                prefix: prefix.clone(),
                source,
            })?;

            debug!(prefix = %prefix, objects = listing.len(), "Listed prefix");

            for object in listing {
                let body = until_cancelled(
                    cancel,
                    Stage::Fetching,
                    self.store.get_object(&request.bucket, &object.key),
                )
                .await?
                .map_err(|source| AggregateError::Fetch {
                    bucket: request.bucket.clone(),
                    key: object.key.clone(),
                    source,
                })?;

                let start = collected.bytes.len();
                let copied = copy_body(body, &object.key, &mut collected.bytes, cancel).await?;

                if let Err(err) = std::str::from_utf8(&collected.bytes[start..]) {
                    warn!(
                        bucket = %request.bucket,
                        key = %object.key,
                        valid_up_to = err.valid_up_to(),
                        "Object is not valid UTF-8, invalid sequences will be replaced"
                    );
                }

                if let Some(failure) = copied {
                    warn!(
                        bucket = %request.bucket,
                        key = %object.key,
                        bytes_copied = failure.bytes_copied,
                        error = %failure.source,
                        "Failed to read object, keeping partial content"
                    );
                    collected.copy_failures.push(failure);
                }

                collected.bytes.push(SEPARATOR);
                collected.objects += 1;
            }
        }

        Ok(collected)
    }

    async fn upload(
        &self,
        request: &AggregateRequest,
        artifact: &dyn StagedArtifact,
        cancel: &CancellationToken,
    ) -> Result<(), AggregateError> {
        let upload_error = |source: StorageError| AggregateError::Upload {
            bucket: request.bucket.clone(),
            key: request.destination_key.clone(),
            source,
        };

        let body = until_cancelled(cancel, Stage::Uploading, artifact.open())
            .await?
            .map_err(upload_error)?;

        until_cancelled(
            cancel,
            Stage::Uploading,
            self.store.put_object(
                &request.bucket,
                &request.destination_key,
                body,
                Some(COMBINED_CONTENT_TYPE),
            ),
        )
        .await?
        .map_err(upload_error)
    }
}

#[async_trait]
impl AggregationService for AggregationServiceImpl {
    async fn aggregate(
        &self,
        request: AggregateRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutput, AggregateError> {
        info!(
            bucket = %request.bucket,
            prefixes = request.prefixes.len(),
            destination = %request.destination_key,
            "Starting aggregation"
        );

        let collected = self.collect(&request, cancel).await?;

        let content = match String::from_utf8(collected.bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };

        // The artifact is removed when it goes out of scope, on every path.
        let artifact = until_cancelled(
            cancel,
            Stage::Staging,
            self.scratch.stage(Bytes::from(content.clone())),
        )
        .await?
        .map_err(|source| AggregateError::Staging { source })?;

        debug!(
            path = %artifact.path().display(),
            bytes = artifact.len(),
            "Staged combined content"
        );

        self.upload(&request, &*artifact, cancel).await?;

        info!(
            bucket = %request.bucket,
            destination = %request.destination_key,
            objects = collected.objects,
            bytes = content.len(),
            truncated = collected.copy_failures.len(),
            "Uploaded combined content"
        );

        Ok(AggregateOutput {
            content,
            objects: collected.objects,
            copy_failures: collected.copy_failures,
        })
    }
}

/// Run `fut` unless `cancel` fires first
async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    stage: Stage,
    fut: F,
) -> Result<F::Output, AggregateError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AggregateError::Cancelled { stage }),
        output = fut => Ok(output),
    }
}

/// Append the whole of `body` to `accumulator`. A read failure ends the copy
/// and is returned as a `CopyError`; only cancellation is fatal. `body` is
/// owned here so it is released as soon as the copy attempt ends.
async fn copy_body(
    mut body: ByteStream,
    key: &ObjectKey,
    accumulator: &mut Vec<u8>,
    cancel: &CancellationToken,
) -> Result<Option<CopyError>, AggregateError> {
    let mut bytes_copied = 0u64;

    loop {
        match until_cancelled(cancel, Stage::Copying, body.next()).await? {
            None => return Ok(None),
            Some(Ok(chunk)) => {
                bytes_copied += chunk.len() as u64;
                accumulator.extend_from_slice(&chunk);
            }
            Some(Err(source)) => {
                return Ok(Some(CopyError {
                    key: key.clone(),
                    bytes_copied,
                    source,
                }));
            }
        }
    }
}

/// Builder for AggregationServiceImpl
pub struct AggregationServiceBuilder {
    store: Option<Arc<dyn ObjectStore>>,
    scratch: Option<Arc<dyn ScratchSpace>>,
}

impl AggregationServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            scratch: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn scratch(mut self, scratch: Arc<dyn ScratchSpace>) -> Self {
        self.scratch = Some(scratch);
        self
    }

    pub fn build(self) -> Result<AggregationServiceImpl, &'static str> {
        let store = self.store.ok_or("Store is required")?;
        let scratch = self.scratch.ok_or("Scratch space is required")?;

        Ok(AggregationServiceImpl::new(store, scratch))
    }
}

impl Default for AggregationServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
