#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use prefix_aggregator::{
    ports::storage::{bytes_stream, collect_bytes},
    ApacheObjectStoreAdapter, BucketName, ByteStream, ObjectInfo, ObjectKey, ObjectStore,
    StorageError,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

pub fn bucket(name: &str) -> BucketName {
    BucketName::new(name).unwrap()
}

pub fn key(name: &str) -> ObjectKey {
    ObjectKey::new(name).unwrap()
}

/// A stored object as seen by `put_object`
#[derive(Debug, Clone)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// In-memory store with scripted failures and a call log
pub struct ScriptedStore {
    inner: ApacheObjectStoreAdapter,
    failing_prefixes: HashSet<String>,
    failing_gets: HashSet<String>,
    /// key -> number of bytes delivered before the body read fails
    truncated_bodies: HashMap<String, usize>,
    /// Overrides the backend listing order
    listing_order: Option<Vec<String>>,
    fail_put: bool,
    pub gets: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<Upload>>,
    pub released_bodies: std::sync::Arc<Mutex<Vec<String>>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            inner: ApacheObjectStoreAdapter::in_memory(),
            failing_prefixes: HashSet::new(),
            failing_gets: HashSet::new(),
            truncated_bodies: HashMap::new(),
            listing_order: None,
            fail_put: false,
            gets: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            released_bodies: Default::default(),
        }
    }

    pub async fn with_object(self, bucket_name: &str, name: &str, body: &str) -> Self {
        self.with_bytes(bucket_name, name, body.as_bytes()).await
    }

    pub async fn with_bytes(self, bucket_name: &str, name: &str, body: &[u8]) -> Self {
        self.inner
            .put_object(
                &bucket(bucket_name),
                &key(name),
                bytes_stream(body.to_vec()),
                None,
            )
            .await
            .unwrap();
        self
    }

    pub fn failing_list(mut self, prefix: &str) -> Self {
        self.failing_prefixes.insert(prefix.to_string());
        self
    }

    pub fn failing_get(mut self, name: &str) -> Self {
        self.failing_gets.insert(name.to_string());
        self
    }

    pub fn truncated_body(mut self, name: &str, after_bytes: usize) -> Self {
        self.truncated_bodies.insert(name.to_string(), after_bytes);
        self
    }

    /// Return listings in this key order instead of the backend's
    pub fn listing_order(mut self, keys: &[&str]) -> Self {
        self.listing_order = Some(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn failing_put(mut self) -> Self {
        self.fail_put = true;
        self
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().expect("poisoned mutex").clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().expect("poisoned mutex").clone()
    }

    pub fn released_bodies(&self) -> Vec<String> {
        self.released_bodies.lock().expect("poisoned mutex").clone()
    }

    /// Current content of an object, bypassing failure scripts
    pub async fn read(&self, bucket_name: &str, name: &str) -> Vec<u8> {
        let body = self
            .inner
            .get_object(&bucket(bucket_name), &key(name))
            .await
            .unwrap();
        collect_bytes(body).await.unwrap()
    }
}

/// Records the key when the body stream is dropped
struct ReleaseGuard {
    key: String,
    released: std::sync::Arc<Mutex<Vec<String>>>,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.released
            .lock()
            .expect("poisoned mutex")
            .push(self.key.clone());
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    async fn list_objects(
        &self,
        bucket: &BucketName,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, StorageError> {
        if self.failing_prefixes.contains(prefix) {
            return Err(StorageError::AccessDenied {
                key: prefix.to_string(),
                operation: "ListObjectsV2".to_string(),
            });
        }

        let mut objects = self.inner.list_objects(bucket, prefix).await?;
        if let Some(order) = &self.listing_order {
            objects.sort_by_key(|info| {
                order
                    .iter()
                    .position(|k| k == info.key.as_str())
                    .unwrap_or(usize::MAX)
            });
        }
        Ok(objects)
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> Result<ByteStream, StorageError> {
        self.gets
            .lock()
            .expect("poisoned mutex")
            .push(key.to_string());

        if self.failing_gets.contains(key.as_str()) {
            return Err(StorageError::InfrastructureError {
                message: "GetObject returned 503 SlowDown".to_string(),
                source: None,
            });
        }

        let body = collect_bytes(self.inner.get_object(bucket, key).await?).await?;
        let guard = ReleaseGuard {
            key: key.to_string(),
            released: self.released_bodies.clone(),
        };

        let stream = match self.truncated_bodies.get(key.as_str()) {
            Some(&after) => {
                let head = Bytes::copy_from_slice(&body[..after.min(body.len())]);
                async_stream::stream! {
                    let _guard = guard;
                    yield Ok::<_, StorageError>(head);
                    yield Err(StorageError::Io {
                        message: "unexpected EOF while reading body".to_string(),
                    });
                    yield Ok(Bytes::from_static(b"unreachable"));
                }
                .boxed()
            }
            None => async_stream::stream! {
                let _guard = guard;
                for chunk in body.chunks(2) {
                    yield Ok::<_, StorageError>(Bytes::copy_from_slice(chunk));
                }
            }
            .boxed(),
        };

        Ok(stream)
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: ByteStream,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let body = collect_bytes(body).await?;

        if self.fail_put {
            return Err(StorageError::AccessDenied {
                key: key.to_string(),
                operation: "PutObject".to_string(),
            });
        }

        self.uploads.lock().expect("poisoned mutex").push(Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: body.clone(),
            content_type: content_type.map(str::to_string),
        });

        self.inner
            .put_object(bucket, key, bytes_stream(body), content_type)
            .await
    }
}
