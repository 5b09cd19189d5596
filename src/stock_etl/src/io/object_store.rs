//! Remote object storage for finished artifacts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use snafu::Snafu;
use tracing::debug;

use crate::config::UploadConfig;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ObjectStoreError {
    /// The local file could not be opened for streaming.
    #[snafu(display("Cannot read {}: {message}", path.display()))]
    ReadLocal { path: PathBuf, message: String },

    /// The store rejected the object or could not be reached.
    #[snafu(display("PutObject s3://{bucket}/{key} failed: {message}"))]
    Put {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Destination for uploaded artifacts. The bucket must already exist.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the file at `path` as `bucket/key`, returning once the store
    /// has acknowledged the write.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> Result<(), ObjectStoreError>;
}

/// S3 (or S3-compatible) store using the ambient AWS credential chain.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads credentials and region from the environment, then applies the
    /// overrides in `upload`.
    pub async fn from_config(upload: &UploadConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &upload.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &upload.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(upload.force_path_style);

        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> Result<(), ObjectStoreError> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            ReadLocalSnafu {
                path,
                message: e.to_string(),
            }
            .build()
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                PutSnafu {
                    bucket,
                    key,
                    message: DisplayErrorContext(&e).to_string(),
                }
                .build()
            })?;

        debug!(bucket, key, "object stored");
        Ok(())
    }
}
