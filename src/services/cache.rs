use crate::config::MAX_CACHE_TTL;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use tokio::time::Instant;

/// Short-lived fingerprint -> storage location map used to skip re-uploads.
///
/// Lookups are synchronous. Implementations must be safe to share across
/// request tasks.
pub trait CacheStore: Send + Sync {
    /// Returns the location if a live entry exists. Expired entries read as absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Records `location` for `ttl` unless a live entry already exists, in
    /// which case the existing location is kept. Returns whichever location
    /// the cache now holds. `ttl` is capped at [`MAX_CACHE_TTL`].
    fn insert(&self, key: &str, location: String, ttl: Duration) -> String;

    fn remove(&self, key: &str) -> Option<String>;

    /// Drops every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize;

    /// Number of stored entries, including expired ones not yet purged.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    location: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process [`CacheStore`] on top of `DashMap`. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(entry.location.clone());
            }
        }
        // The read guard is gone by now; removing while holding it would deadlock the shard
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    fn insert(&self, key: &str, location: String, ttl: Duration) -> String {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl.min(MAX_CACHE_TTL))
            .unwrap_or(now);
        let fresh = CacheEntry {
            location: location.clone(),
            expires_at,
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return occupied.get().location.clone();
                }
                occupied.insert(fresh);
                location
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                location
            }
        }
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, entry)| entry.location)
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
