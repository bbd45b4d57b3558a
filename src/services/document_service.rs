use crate::config::AppConfig;
use crate::models::{ContentFingerprint, UploadResult};
use crate::services::cache::CacheStore;
use crate::services::storage::BlobStore;
use crate::utils::hash::compute_fingerprint;
use crate::utils::keyed_mutex::KeyedMutex;
use crate::utils::validation::sanitize_filename;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Uploaded file could not be read: {0}")]
    Unreadable(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Storage container unavailable: {0:#}")]
    Container(anyhow::Error),

    #[error("Upload failed: {0:#}")]
    Upload(anyhow::Error),
}

/// Counts returned by [`DocumentService::evict_expired`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvictionStats {
    pub cache_entries: usize,
    pub idle_locks: usize,
}

/// Stores uploaded documents, skipping the upload when identical content was
/// stored within the cache window.
///
/// Two concurrent saves of the same new content may both upload unless
/// single-flight mode is enabled. Uploads overwrite, so the stored object
/// converges either way.
pub struct DocumentService {
    cache: Arc<dyn CacheStore>,
    storage: Arc<dyn BlobStore>,
    upload_prefix: String,
    cache_ttl: Duration,
    in_flight: Option<KeyedMutex>,
}

impl DocumentService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        storage: Arc<dyn BlobStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            cache,
            storage,
            upload_prefix: config.upload_prefix.trim_matches('/').to_string(),
            cache_ttl: config.cache_ttl,
            in_flight: config.single_flight.then(KeyedMutex::new),
        }
    }

    pub fn is_single_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Saves `data` under a key derived from `file_name`. Never fails: storage
    /// errors come back as `success: false` with the cause in `error_message`.
    pub async fn save_document(&self, data: Bytes, file_name: &str) -> UploadResult {
        let fingerprint = compute_fingerprint(&data);

        match self.store(&fingerprint, data, file_name).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    file_name = %file_name,
                    error = %e,
                    "Document upload failed"
                );
                UploadResult::failure(e.to_string())
            }
        }
    }

    async fn store(
        &self,
        fingerprint: &ContentFingerprint,
        data: Bytes,
        file_name: &str,
    ) -> Result<UploadResult, DocumentError> {
        if let Some(location) = self.cached_location(fingerprint) {
            return Ok(UploadResult::from_cache(location));
        }

        let _flight = match &self.in_flight {
            Some(locks) => {
                let guard = locks.lock(fingerprint.as_str()).await;
                // Whoever held the lock before us may have finished the upload
                if let Some(location) = self.cached_location(fingerprint) {
                    return Ok(UploadResult::from_cache(location));
                }
                Some(guard)
            }
            None => None,
        };

        let location = self.location_for(file_name)?;

        self.storage
            .ensure_container_exists()
            .await
            .map_err(DocumentError::Container)?;
        self.storage
            .upload(&location, data)
            .await
            .map_err(DocumentError::Upload)?;

        let held = self
            .cache
            .insert(fingerprint.as_str(), location.clone(), self.cache_ttl);
        if held != location {
            tracing::debug!(
                fingerprint = %fingerprint,
                cached = %held,
                uploaded = %location,
                "Concurrent upload already cached this content"
            );
        }

        tracing::info!(fingerprint = %fingerprint, location = %location, "Document stored");
        Ok(UploadResult::stored(location))
    }

    fn cached_location(&self, fingerprint: &ContentFingerprint) -> Option<String> {
        let location = self.cache.get(fingerprint.as_str())?;
        tracing::debug!(fingerprint = %fingerprint, location = %location, "Dedup cache hit");
        Some(location)
    }

    /// Storage key for an uploaded file: `<prefix>/<sanitized name>`.
    pub fn location_for(&self, file_name: &str) -> Result<String, DocumentError> {
        let name = sanitize_filename(file_name)
            .map_err(|e| DocumentError::InvalidFileName(e.to_string()))?;
        if self.upload_prefix.is_empty() {
            Ok(name)
        } else {
            Ok(format!("{}/{}", self.upload_prefix, name))
        }
    }

    /// Explicitly drops the cache entry for `fingerprint`.
    pub fn forget(&self, fingerprint: &ContentFingerprint) -> Option<String> {
        self.cache.remove(fingerprint.as_str())
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn evict_expired(&self) -> EvictionStats {
        EvictionStats {
            cache_entries: self.cache.purge_expired(),
            idle_locks: self.in_flight.as_ref().map_or(0, KeyedMutex::cleanup),
        }
    }
}
