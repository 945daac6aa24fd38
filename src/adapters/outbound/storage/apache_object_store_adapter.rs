use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::{
    memory::InMemory, path::Path as ObjectPath, Attribute, Attributes,
    ObjectStore as ApacheObjectStore, PutOptions, PutPayload,
};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{ByteStream, ObjectInfo, ObjectStore},
};

type StoreFactory =
    dyn Fn(&BucketName) -> StorageResult<Arc<dyn ApacheObjectStore>> + Send + Sync + 'static;

/// Adapter that implements our ObjectStore trait using Apache object_store.
///
/// An `object_store` handle is bound to a single bucket, so handles are
/// built on first use from the factory and memoized per bucket.
pub struct ApacheObjectStoreAdapter {
    factory: Box<StoreFactory>,
    stores: RwLock<HashMap<BucketName, Arc<dyn ApacheObjectStore>>>,
}

impl ApacheObjectStoreAdapter {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&BucketName) -> StorageResult<Arc<dyn ApacheObjectStore>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Every bucket gets its own empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(|_| Ok(Arc::new(InMemory::new()) as Arc<dyn ApacheObjectStore>))
    }

    /// Register an existing handle for `bucket`
    pub fn with_bucket(self, bucket: BucketName, store: Arc<dyn ApacheObjectStore>) -> Self {
        if let Ok(mut stores) = self.stores.write() {
            stores.insert(bucket, store);
        }
        self
    }

    fn store(&self, bucket: &BucketName) -> StorageResult<Arc<dyn ApacheObjectStore>> {
        if let Some(store) = self.stores.read().map_err(lock_poisoned)?.get(bucket) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().map_err(lock_poisoned)?;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store = (self.factory)(bucket)?;
        stores.insert(bucket.clone(), store.clone());
        Ok(store)
    }
}

fn lock_poisoned<T>(_: T) -> StorageError {
    StorageError::InfrastructureError {
        message: "Store registry lock poisoned".to_string(),
        source: None,
    }
}

/// Keys are used verbatim. `ObjectPath::from` would percent-encode segments
/// and address a different object than the one listed.
fn object_path(key: &str) -> StorageResult<ObjectPath> {
    Ok(ObjectPath::parse(key)?)
}

/// `object_store` lists by path segment, so a raw prefix is listed from its
/// last complete segment and filtered afterwards.
fn listing_root(prefix: &str) -> StorageResult<Option<ObjectPath>> {
    let Some(idx) = prefix.rfind(object_store::path::DELIMITER) else {
        return Ok(None);
    };

    let root = object_path(&prefix[..idx])?;
    Ok(Some(root).filter(|root| root.as_ref() != ""))
}

#[async_trait]
impl ObjectStore for ApacheObjectStoreAdapter {
    async fn list_objects(
        &self,
        bucket: &BucketName,
        prefix: &str,
    ) -> StorageResult<Vec<ObjectInfo>> {
        let store = self.store(bucket)?;
        let root = listing_root(prefix)?;

        // The list stream follows continuation tokens until the listing is
        // exhausted.
        let mut stream = store.list(root.as_ref());
        let mut objects = Vec::new();

        while let Some(result) = stream.next().await {
            let meta = result?;
            let key = ObjectKey::new(meta.location.to_string()).map_err(|e| {
                StorageError::ValidationError {
                    message: format!("Invalid object key from store: {}", e),
                }
            })?;

            if !key.has_prefix(prefix) {
                continue;
            }

            objects.push(ObjectInfo {
                key,
                size: meta.size,
                etag: meta.e_tag,
            });
        }

        Ok(objects)
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<ByteStream> {
        let store = self.store(bucket)?;
        let path = object_path(key.as_str())?;

        let result = store.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                StorageError::ObjectNotFound { key: key.clone() }
            }
            other => other.into(),
        })?;

        Ok(result
            .into_stream()
            .map(|chunk| chunk.map_err(StorageError::from))
            .boxed())
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        body: ByteStream,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        let store = self.store(bucket)?;
        let path = object_path(key.as_str())?;

        let chunks: Vec<Bytes> = body.try_collect().await?;
        let payload: PutPayload = chunks.into_iter().collect();

        let mut attributes = Attributes::new();
        if let Some(content_type) = content_type {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        store.put_opts(&path, payload, options).await?;

        Ok(())
    }
}
