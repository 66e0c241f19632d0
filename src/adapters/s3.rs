use crate::config::BlobConfig;
use crate::ports::storage::BlobStore;
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info};

/// Region name S3-compatible stores such as R2 expect.
const BLOB_REGION: &str = "auto";

/// S3BlobStore implements BlobStore for any S3-compatible endpoint.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Client with static credentials against the configured endpoint,
    /// writing to the video bucket.
    pub fn from_config(config: &BlobConfig) -> Self {
        let credentials =
            Credentials::new(&config.access_key, &config.secret_key, None, None, "static");
        let s3_config = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(BLOB_REGION))
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            // plain PUT bodies, no checksum trailers
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .behavior_version_latest()
            .build();

        info!(
            account = %config.account_id,
            endpoint = %config.endpoint,
            bucket = %config.video_bucket,
            "blob store configured"
        );
        Self::new(Client::from_conf(s3_config), config.video_bucket.clone())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let body = ByteStream::from_path(local_path).await?;
        debug!(bucket = %self.bucket, key, "uploading");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await?;
        Ok(())
    }
}
