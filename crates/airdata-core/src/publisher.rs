use std::sync::Arc;

use airdata_bucket::BucketStore;
use bytes::Bytes;

use crate::error::PublishError;

pub const OBJECT_PREFIX: &str = "airdata/";
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Writes encoded exports into the configured bucket.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn BucketStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn BucketStore>) -> Self {
        Self { store }
    }

    pub fn object_key(key: &str) -> String {
        format!("{OBJECT_PREFIX}{key}.csv")
    }

    /// Uploads `payload` as `airdata/{key}.csv` in a single put and returns its location.
    pub async fn publish(&self, key: &str, payload: Bytes) -> Result<String, PublishError> {
        let object_key = Self::object_key(key);
        self.store
            .put_object(&object_key, payload, CSV_CONTENT_TYPE)
            .await
            .map_err(|source| PublishError {
                key: object_key,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use airdata_bucket::MemoryBucketStore;

    use super::*;

    #[test]
    fn object_key_has_prefix_and_extension() {
        assert_eq!(
            Publisher::object_key("2023-06-01T15:00:00Z"),
            "airdata/2023-06-01T15:00:00Z.csv"
        );
    }

    #[tokio::test]
    async fn publish_stores_csv_object() {
        let store = MemoryBucketStore::new("air-exports");
        let publisher = Publisher::new(Arc::new(store.clone()));

        let location = publisher
            .publish("2023-06-01T15:00:00Z", Bytes::from_static(b"a,b,1\n"))
            .await
            .unwrap();

        assert_eq!(location, "memory://air-exports/airdata/2023-06-01T15:00:00Z.csv");
        let object = store.get("airdata/2023-06-01T15:00:00Z.csv").unwrap();
        assert_eq!(object.bytes.as_ref(), b"a,b,1\n");
        assert_eq!(object.content_type, CSV_CONTENT_TYPE);
    }
}
