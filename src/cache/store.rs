use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::cache::entry::CacheEntry;
use crate::cache::id::{generate_cache_id, log_prefix};
use crate::cache::sweeper;
use crate::image_processing::InlineImage;

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug)]
pub struct CacheSettings {
    /// Absolute lifetime of an entry, measured from `store`.
    pub retention: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// In-memory staging area for original images during a refine session.
///
/// Every operation, including the background sweep, goes through a single
/// lock over the entry map, so they are totally ordered. Entries are handed
/// out as `Arc`s; a reader never observes a partially written entry and the
/// lock is released before the caller does anything slow with the payload.
///
/// Construction spawns the sweep task and therefore needs a tokio runtime.
#[derive(Debug)]
pub struct ArtifactCache {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    settings: CacheSettings,
    shutdown: CancellationToken,
}

impl ArtifactCache {
    pub fn new(settings: CacheSettings) -> Arc<Self> {
        let cache = Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            settings,
            shutdown: CancellationToken::new(),
        });
        sweeper::spawn(
            Arc::downgrade(&cache),
            settings.sweep_interval,
            cache.shutdown.clone(),
        );
        cache
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    pub fn store(&self, payload: InlineImage) -> String {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut id = generate_cache_id();
        while entries.contains_key(&id) {
            id = generate_cache_id();
        }
        let size = payload.bytes.len();
        entries.insert(id.clone(), Arc::new(CacheEntry::new(id.clone(), payload)));
        drop(entries);
        tracing::debug!(cache_id = %log_prefix(&id), size, "Staged artifact");
        id
    }

    /// Returns the entry while it is inside the retention window. Reading does
    /// not extend its lifetime.
    pub fn get(&self, cache_id: &str) -> Option<Arc<CacheEntry>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(cache_id)
            .filter(|entry| !entry.is_expired(self.settings.retention))
            .cloned()
    }

    pub fn delete(&self, cache_id: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(cache_id)
            .is_some();
        if removed {
            tracing::debug!(cache_id = %log_prefix(cache_id), "Removed artifact");
        }
        removed
    }

    pub fn count(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|entry| !entry.is_expired(self.settings.retention))
            .count()
    }

    /// Drops every entry older than the retention window, returning how many
    /// were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.settings.retention));
        before - entries.len()
    }

    /// Stops the background sweep. Entries already staged stay readable until
    /// they expire.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    #[cfg(test)]
    pub(crate) fn stored_len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for ArtifactCache {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn payload(bytes: &[u8]) -> InlineImage {
        InlineImage {
            bytes: bytes.to_vec(),
            mime_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn stored_payload_is_returned_unchanged() {
        let cache = ArtifactCache::new(CacheSettings::default());
        let id = cache.store(payload(b"original-bytes"));

        let entry = cache.get(&id).expect("entry should be live");
        assert_eq!(entry.id, id);
        assert_eq!(entry.payload.bytes, b"original-bytes");
        assert_eq!(entry.payload.mime_type, "image/png");
        assert_eq!(cache.count(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let cache = ArtifactCache::new(CacheSettings::default());
        assert!(cache.get("does-not-exist").is_none());
        assert!(!cache.delete("does-not-exist"));
    }

    #[tokio::test]
    async fn delete_succeeds_exactly_once() {
        let cache = ArtifactCache::new(CacheSettings::default());
        let id = cache.store(payload(b"x"));

        assert!(cache.delete(&id));
        assert!(!cache.delete(&id));
        assert!(!cache.delete(&id));
        assert!(cache.get(&id).is_none());
        assert_eq!(cache.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn get_does_not_refresh_age() {
        let cache = ArtifactCache::new(CacheSettings::default());
        let id = cache.store(payload(b"x"));

        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(5 * 60)).await;
            assert!(cache.get(&id).is_some());
        }
        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        assert!(cache.get(&id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_hidden_before_the_sweep_runs() {
        let cache = ArtifactCache::new(CacheSettings {
            retention: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(3600),
        });
        let id = cache.store(payload(b"x"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get(&id).is_none());
        assert_eq!(cache.count(), 0);
        assert_eq!(cache.stored_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_tick_reclaims_expired_entries() {
        let cache = ArtifactCache::new(CacheSettings::default());
        let old = cache.store(payload(b"old"));

        tokio::time::sleep(Duration::from_secs(20 * 60)).await;
        let young = cache.store(payload(b"young"));

        // Past the 35 minute tick: `old` is 36 minutes old, `young` 16.
        tokio::time::sleep(Duration::from_secs(16 * 60)).await;

        assert_eq!(cache.stored_len(), 1);
        assert!(cache.get(&old).is_none());
        assert_eq!(cache.get(&young).expect("young entry").payload.bytes, b"young");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_sweeper() {
        let cache = ArtifactCache::new(CacheSettings::default());
        cache.shutdown();
        tokio::task::yield_now().await;
        let id = cache.store(payload(b"x"));

        tokio::time::sleep(Duration::from_secs(60 * 60)).await;

        assert_eq!(cache.stored_len(), 1);
        assert!(cache.get(&id).is_none());
        assert_eq!(cache.sweep_expired(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_return_distinct_ids() {
        let cache = ArtifactCache::new(CacheSettings::default());
        let mut handles = Vec::new();
        for task in 0..8u8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                (0..150)
                    .map(|n| cache.store(payload(&[task, n as u8])))
                    .collect::<Vec<_>>()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(ids.insert(id), "duplicate cache id");
            }
        }
        assert_eq!(ids.len(), 1200);
        assert_eq!(cache.count(), 1200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_racing_deletes_see_whole_entries_or_nothing() {
        let cache = ArtifactCache::new(CacheSettings::default());
        let ids: Vec<String> = (0..200u8)
            .map(|n| cache.store(payload(&[n; 64])))
            .collect();

        let reader = {
            let cache = cache.clone();
            let ids = ids.clone();
            tokio::spawn(async move {
                for id in ids.iter().cycle().take(2000) {
                    if let Some(entry) = cache.get(id) {
                        let first = entry.payload.bytes[0];
                        assert!(entry.payload.bytes.iter().all(|b| *b == first));
                    }
                }
            })
        };
        let deleter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                ids.iter().filter(|id| cache.delete(id)).count()
            })
        };

        reader.await.unwrap();
        assert_eq!(deleter.await.unwrap(), 200);
        assert_eq!(cache.count(), 0);
    }
}
