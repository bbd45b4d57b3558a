use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};

/// Durable key -> bytes store documents are written to.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates the container if it does not exist yet. Idempotent.
    async fn ensure_container_exists(&self) -> Result<()>;

    /// Writes `data` at `location`, replacing any existing object.
    async fn upload(&self, location: &str, data: Bytes) -> Result<()>;

    /// Cheap reachability probe for health reporting.
    async fn ping(&self) -> Result<()>;
}

pub struct S3BlobStore {
    client: Client,
    bucket: String,
    container_ready: AtomicBool,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self {
            client,
            bucket,
            container_ready: AtomicBool::new(false),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_bucket(&self) -> Result<()> {
        tracing::info!("🪣 Bucket '{}' not found, creating...", self.bucket);
        if let Err(e) = self.client.create_bucket().bucket(&self.bucket).send().await {
            let service_error = e.into_service_error();
            // Lost a creation race with another request or replica
            if !(service_error.is_bucket_already_owned_by_you()
                || service_error.is_bucket_already_exists())
            {
                return Err(anyhow!(service_error));
            }
        }
        tracing::info!("✅ Bucket '{}' created", self.bucket);
        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn ensure_container_exists(&self) -> Result<()> {
        if self.container_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {}
            Err(e) => {
                let service_error = e.into_service_error();
                if !service_error.is_not_found() {
                    return Err(anyhow!(service_error));
                }
                self.create_bucket().await?;
            }
        }

        self.container_ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn upload(&self, location: &str, data: Bytes) -> Result<()> {
        let size = data.len();
        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(location)
            .content_type("application/pdf")
            .body(ByteStream::from(data))
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, size={}, error={:?}",
                self.bucket,
                location,
                size,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| anyhow!(e.into_service_error()))?;
        Ok(())
    }
}
