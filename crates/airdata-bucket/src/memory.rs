use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{BucketError, BucketStore};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// In-process store used by tests and local dry runs. Clones share the same objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryBucketStore {
    bucket: String,
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
}

impl MemoryBucketStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.lock().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>>, BucketError> {
        self.objects
            .lock()
            .map_err(|_| BucketError::Sdk("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, BucketError> {
        self.lock()?.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("memory://{}/{}", self.bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_overwrites_and_reports_location() {
        let store = MemoryBucketStore::new("exports");
        let shared = store.clone();

        store
            .put_object("airdata/a.csv", Bytes::from_static(b"one"), "text/csv")
            .await
            .unwrap();
        let location = store
            .put_object("airdata/a.csv", Bytes::from_static(b"two"), "text/csv")
            .await
            .unwrap();

        assert_eq!(location, "memory://exports/airdata/a.csv");
        assert_eq!(shared.keys(), vec!["airdata/a.csv".to_string()]);
        let object = shared.get("airdata/a.csv").unwrap();
        assert_eq!(object.bytes.as_ref(), b"two");
        assert_eq!(object.content_type, "text/csv");
    }
}
