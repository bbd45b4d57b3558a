use crate::services::document_service::DocumentService;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Periodically purges expired dedup entries until shutdown is signalled.
pub struct CacheSweeper {
    documents: Arc<DocumentService>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl CacheSweeper {
    pub fn new(
        documents: Arc<DocumentService>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            documents,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🧹 Cache sweeper started (every {:?})", self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Cache sweeper shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.sweep();
                }
            }
        }
    }

    fn sweep(&self) {
        let stats = self.documents.evict_expired();
        if stats.cache_entries > 0 || stats.idle_locks > 0 {
            tracing::debug!(
                evicted = stats.cache_entries,
                idle_locks = stats.idle_locks,
                remaining = self.documents.cached_entries(),
                "Swept dedup cache"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::cache::{CacheStore, MemoryCache};
    use crate::services::storage::BlobStore;
    use async_trait::async_trait;
    use bytes::Bytes;

    struct NullStore;

    #[async_trait]
    impl BlobStore for NullStore {
        async fn ensure_container_exists(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn upload(&self, _location: &str, _data: Bytes) -> anyhow::Result<()> {
            Ok(())
        }
        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_and_stops() {
        let cache = Arc::new(MemoryCache::new());
        let config = AppConfig {
            cache_ttl: Duration::from_secs(30),
            ..AppConfig::development()
        };
        let documents = Arc::new(DocumentService::new(
            cache.clone(),
            Arc::new(NullStore),
            &config,
        ));
        documents
            .save_document(Bytes::from_static(b"%PDF-1.4 sweep"), "a.pdf")
            .await;
        assert_eq!(cache.len(), 1);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(
            CacheSweeper::new(documents.clone(), Duration::from_secs(10), rx).run(),
        );

        // Entry expires at 30s, next sweep tick after that is at 40s
        tokio::time::sleep(Duration::from_secs(41)).await;
        assert!(cache.is_empty());

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
