use crate::config::AppConfig;
use crate::services::storage::{BlobStore, S3BlobStore};
use anyhow::Context;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the S3-compatible blob store from the storage connection string and
/// makes sure the container exists. A container that cannot be created yet is
/// logged and retried on the first upload.
pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<S3BlobStore>> {
    let conn = config
        .storage_connection()
        .context("invalid storage configuration")?;

    info!(
        "☁️  Blob Storage: {} (Container: {})",
        conn.endpoint, config.container_name
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&conn.endpoint)
        .region(Region::new(conn.region.clone()))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            conn.access_key_id.clone(),
            conn.secret_access_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let store = Arc::new(S3BlobStore::new(
        aws_sdk_s3::Client::from_conf(s3_config),
        config.container_name.clone(),
    ));

    match store.ensure_container_exists().await {
        Ok(()) => info!("✅ Container '{}' is ready", store.bucket()),
        Err(e) => warn!(
            "❌ Container '{}' not ready yet, will retry on upload: {:#}",
            store.bucket(),
            e
        ),
    }

    Ok(store)
}
