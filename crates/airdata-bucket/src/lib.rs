//! Abstractions over S3-compatible storage backends used for exported air-quality files.

mod memory;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;
use url::Url;

pub use memory::{MemoryBucketStore, StoredObject};

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

impl S3Config {
    /// Base URL that object keys are appended to when reporting an upload location.
    ///
    /// Custom endpoints (MinIO, localstack, ...) always report path-style URLs; AWS reports
    /// the virtual-hosted form.
    pub fn location_base(&self) -> Result<Url, BucketError> {
        let raw = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.s3.{}.amazonaws.com/", self.bucket, self.region),
        };
        let mut base = Url::parse(&raw)
            .map_err(|err| BucketError::Configuration(format!("invalid endpoint '{raw}': {err}")))?;

        if self.endpoint.is_some() {
            base.path_segments_mut()
                .map_err(|_| {
                    BucketError::Configuration(format!("endpoint '{raw}' cannot hold a path"))
                })?
                .pop_if_empty()
                .push(&self.bucket);
        }

        Ok(base)
    }
}

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sdk error: {0}")]
    Sdk(String),
}

impl BucketError {
    fn from_sdk(err: impl fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }
}

/// Minimal write-side view of an object store: one atomic put per object.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Stores `bytes` under `key`, overwriting any existing object, and returns the
    /// store's location for it.
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, BucketError>;
}

#[derive(Clone)]
pub struct S3BucketStore {
    client: Client,
    bucket: String,
    location_base: Url,
}

impl S3BucketStore {
    pub async fn new(config: S3Config) -> Result<Self, BucketError> {
        if config.bucket.is_empty() {
            return Err(BucketError::Configuration(
                "bucket name cannot be empty".into(),
            ));
        }

        let location_base = config.location_base()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(access_key, secret_key, None, None, "static");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        let shared_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        Ok(Self {
            client,
            bucket: config.bucket,
            location_base,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BucketStore for S3BucketStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, BucketError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(BucketError::from_sdk)?;

        object_location(&self.location_base, key)
    }
}

/// Joins `key` onto `base`, escaping each `/`-separated segment.
pub fn object_location(base: &Url, key: &str) -> Result<String, BucketError> {
    let mut location = base.clone();
    location
        .path_segments_mut()
        .map_err(|_| BucketError::Configuration(format!("'{base}' cannot hold a path")))?
        .pop_if_empty()
        .extend(key.split('/'));
    Ok(location.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_location_is_virtual_hosted() {
        let config = S3Config {
            bucket: "air-exports".into(),
            region: "eu-west-1".into(),
            ..S3Config::default()
        };
        let base = config.location_base().unwrap();
        let location = object_location(&base, "airdata/2023-06-01T15:00:00Z.csv").unwrap();
        assert_eq!(
            location,
            "https://air-exports.s3.eu-west-1.amazonaws.com/airdata/2023-06-01T15:00:00Z.csv"
        );
    }

    #[test]
    fn custom_endpoint_location_is_path_style() {
        let config = S3Config {
            bucket: "air-exports".into(),
            endpoint: Some("http://localhost:9000".into()),
            force_path_style: true,
            ..S3Config::default()
        };
        let base = config.location_base().unwrap();
        let location = object_location(&base, "airdata/a b.csv").unwrap();
        assert_eq!(location, "http://localhost:9000/air-exports/airdata/a%20b.csv");
    }

    #[test]
    fn invalid_endpoint_is_a_configuration_error() {
        let config = S3Config {
            bucket: "air-exports".into(),
            endpoint: Some("not a url".into()),
            ..S3Config::default()
        };
        assert!(matches!(
            config.location_base(),
            Err(BucketError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn empty_bucket_is_rejected() {
        let result = S3BucketStore::new(S3Config::default()).await;
        assert!(matches!(result, Err(BucketError::Configuration(_))));
    }
}
