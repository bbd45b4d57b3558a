#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use doc_summary_backend::config::AppConfig;
use doc_summary_backend::models::SummarizationResult;
use doc_summary_backend::services::cache::MemoryCache;
use doc_summary_backend::services::document_service::DocumentService;
use doc_summary_backend::services::storage::BlobStore;
use doc_summary_backend::services::summarizer::Summarizer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PDF: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF";

/// In-memory blob store counting every upload it receives.
#[derive(Default)]
pub struct MockBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
    uploads: AtomicUsize,
    container_checks: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_container: AtomicBool,
    upload_delay: Mutex<Option<Duration>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload_delay(delay: Duration) -> Self {
        let store = Self::default();
        *store.upload_delay.lock().unwrap() = Some(delay);
        store
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn container_checks(&self) -> usize {
        self.container_checks.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_uploads.store(failing, Ordering::SeqCst);
    }

    pub fn set_container_failing(&self, failing: bool) {
        self.fail_container.store(failing, Ordering::SeqCst);
    }

    pub fn object(&self, location: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(location).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn ensure_container_exists(&self) -> anyhow::Result<()> {
        self.container_checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_container.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("bucket could not be created"));
        }
        Ok(())
    }

    async fn upload(&self, location: &str, data: Bytes) -> anyhow::Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);

        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("simulated storage outage"));
        }

        self.objects
            .lock()
            .unwrap()
            .insert(location.to_string(), data);
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Summarizer returning a canned result and recording what it was asked.
pub struct FakeSummarizer {
    result: SummarizationResult,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakeSummarizer {
    pub fn returning(result: SummarizationResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, public_key_pem: &str, storage_location: &str) -> SummarizationResult {
        self.calls
            .lock()
            .unwrap()
            .push((public_key_pem.to_string(), storage_location.to_string()));
        self.result.clone()
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        cache_ttl: Duration::from_secs(600),
        ..AppConfig::development()
    }
}

pub fn document_service(store: Arc<MockBlobStore>, config: &AppConfig) -> DocumentService {
    DocumentService::new(Arc::new(MemoryCache::new()), store, config)
}
