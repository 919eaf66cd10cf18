//! Byte-budgeted in-memory LRU for decoded artwork.
//!
//! Entries live in a sharded [`DashMap`], so lookups and writes for unrelated
//! keys never contend on a shared lock. Reads take the shard read lock only:
//! recency is recorded in per-entry atomics. Byte accounting for a key is adjusted
//! while that key's shard is write-locked, which keeps concurrent `put`s for
//! the same key consistent (last writer wins). Only budget enforcement, which
//! must look across keys, takes the eviction lock.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use dashmap::{DashMap, mapref::entry::Entry};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{artifact::DecodedImage, key::CacheKey, stats::ImageCacheStats};
use crate::units::ByteSize;

pub use super::stats::ImageCacheStatsSnapshot;

/// Default memory budget for decoded artwork.
pub const DEFAULT_MEMORY_BUDGET: ByteSize = ByteSize::from_mib(256);

#[derive(Debug)]
struct CacheEntry {
    artifact: DecodedImage,
    size_bytes: u64,
    /// Nanoseconds since the owning cache's `epoch`.
    last_accessed: AtomicU64,
    access_tick: AtomicU64,
}

impl CacheEntry {
    fn tick(&self) -> u64 {
        self.access_tick.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct ResidentBytes(AtomicU64);

impl ResidentBytes {
    fn load(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    fn store(&self, value: u64) {
        self.0.store(value, Ordering::Release);
    }

    fn replace(&self, removed: u64, added: u64) {
        let mut current = self.load();
        loop {
            let next = current.saturating_sub(removed).saturating_add(added);
            match self.0.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

/// Process-wide cache of decoded images keyed by [`CacheKey`].
#[derive(Debug)]
pub struct ImageCache {
    entries: DashMap<CacheKey, CacheEntry>,
    budget_bytes: AtomicU64,
    resident: ResidentBytes,
    clock: AtomicU64,
    epoch: Instant,
    eviction_lock: Mutex<()>,
    stats: ImageCacheStats,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_BUDGET)
    }
}

impl ImageCache {
    pub fn new(budget: ByteSize) -> Self {
        Self {
            entries: DashMap::new(),
            budget_bytes: AtomicU64::new(budget.as_bytes()),
            resident: ResidentBytes(AtomicU64::new(0)),
            clock: AtomicU64::new(0),
            epoch: Instant::now(),
            eviction_lock: Mutex::new(()),
            stats: ImageCacheStats::default(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn elapsed_nanos(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Look up an artifact, marking it as most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<DecodedImage> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.on_miss();
            return None;
        };
        entry
            .last_accessed
            .store(self.elapsed_nanos(), Ordering::Release);
        entry.access_tick.store(self.tick(), Ordering::Release);
        self.stats.on_hit();
        Some(entry.artifact.clone())
    }

    /// Presence check that does not count as a use.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// When `key` was last read or written.
    pub fn last_accessed(&self, key: &CacheKey) -> Option<Instant> {
        self.entries.get(key).map(|entry| {
            self.epoch + Duration::from_nanos(entry.last_accessed.load(Ordering::Acquire))
        })
    }

    /// Insert or replace an artifact.
    ///
    /// Least recently used entries are evicted first until the new artifact
    /// fits. An artifact larger than the whole budget is not cached, and any
    /// older value under the same key is dropped so it cannot be served.
    pub fn put(&self, key: CacheKey, artifact: DecodedImage, size: ByteSize) {
        let size = size.as_bytes();
        let budget = self.budget_bytes.load(Ordering::Relaxed);
        if size > budget {
            debug!(
                "image cache: {} ({}) exceeds budget {}, not caching",
                key,
                ByteSize::from_bytes(size),
                ByteSize::from_bytes(budget)
            );
            self.stats.on_rejected();
            self.invalidate(&key);
            return;
        }

        let replaced = self
            .entries
            .get(&key)
            .map(|entry| entry.size_bytes)
            .unwrap_or(0);
        let projected = self
            .resident
            .load()
            .saturating_sub(replaced)
            .saturating_add(size);
        if projected > budget {
            self.evict_until(budget.saturating_sub(size), Some(&key));
        }

        let entry = CacheEntry {
            artifact,
            size_bytes: size,
            last_accessed: AtomicU64::new(self.elapsed_nanos()),
            access_tick: AtomicU64::new(self.tick()),
        };
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(entry);
                self.resident.replace(previous.size_bytes, size);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                self.resident.replace(0, size);
            }
        }
        self.stats.on_insert();

        // Concurrent puts for other keys may have pushed us back over.
        if self.resident.load() > budget {
            self.evict_until(budget, Some(&key));
        }
    }

    /// Drop a single entry. Returns true if something was removed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        match self.entries.remove(key) {
            Some((_, entry)) => {
                self.resident.replace(entry.size_bytes, 0);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        let _guard = self.eviction_lock.lock();
        self.entries.clear();
        self.resident.store(0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resident_bytes(&self) -> ByteSize {
        ByteSize::from_bytes(self.resident.load())
    }

    pub fn budget(&self) -> ByteSize {
        ByteSize::from_bytes(self.budget_bytes.load(Ordering::Relaxed))
    }

    /// Change the byte budget, evicting immediately if now over it.
    pub fn set_budget(&self, budget: ByteSize) {
        self.budget_bytes.store(budget.as_bytes(), Ordering::Relaxed);
        if self.resident.load() > budget.as_bytes() {
            self.evict_until(budget.as_bytes(), None);
        }
    }

    pub fn stats(&self) -> ImageCacheStatsSnapshot {
        self.stats.snapshot(self.len(), self.resident_bytes())
    }

    /// Evict least recently used entries until resident bytes are at most
    /// `target`, never touching `keep`.
    fn evict_until(&self, target: u64, keep: Option<&CacheKey>) {
        let _guard = self.eviction_lock.lock();
        if self.resident.load() <= target {
            return;
        }

        let mut candidates: Vec<(CacheKey, u64)> = self
            .entries
            .iter()
            .filter(|entry| Some(entry.key()) != keep)
            .map(|entry| (entry.key().clone(), entry.tick()))
            .collect();
        candidates.sort_by_key(|(_, tick)| *tick);

        let mut evicted = 0usize;
        let mut freed = 0u64;
        for (key, tick) in candidates {
            if self.resident.load() <= target {
                break;
            }
            // An entry touched since the scan is no longer the oldest.
            let removed = self
                .entries
                .remove_if(&key, |_, entry| entry.tick() == tick);
            if let Some((key, entry)) = removed {
                self.resident.replace(entry.size_bytes, 0);
                freed = freed.saturating_add(entry.size_bytes);
                evicted += 1;
                trace!("image cache: evicted {}", key);
            }
        }

        if evicted > 0 {
            self.stats.on_evicted(evicted as u64);
            debug!(
                "image cache: evicted {} images (~{}) => {} / {}",
                evicted,
                ByteSize::from_bytes(freed),
                self.resident_bytes(),
                self.budget()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::ImageLocator;
    use std::sync::Arc;

    fn key(name: &str) -> CacheKey {
        let locator =
            ImageLocator::parse(&format!("https://img.test/{name}.jpg")).unwrap();
        CacheKey::for_locator(&locator)
    }

    fn image(bytes: usize) -> DecodedImage {
        // 1 x n RGBA strip; n * 4 bytes
        let width = (bytes / 4) as u32;
        DecodedImage::from_rgba8(width, 1, vec![0u8; bytes]).unwrap()
    }

    fn put(cache: &ImageCache, name: &str, bytes: usize) {
        let artifact = image(bytes);
        let size = artifact.size_bytes();
        cache.put(key(name), artifact, size);
    }

    #[test]
    fn put_then_get_within_budget() {
        let cache = ImageCache::new(ByteSize::from_bytes(100));
        put(&cache, "a", 40);
        put(&cache, "b", 40);

        assert_eq!(cache.get(&key("a")).map(|i| i.width()), Some(10));
        assert_eq!(cache.get(&key("b")).map(|i| i.width()), Some(10));
        assert_eq!(cache.resident_bytes(), ByteSize::from_bytes(80));
        assert_eq!(cache.get(&key("missing")), None);
    }

    #[test]
    fn least_recently_accessed_is_evicted_first() {
        let cache = ImageCache::new(ByteSize::from_bytes(120));
        put(&cache, "a", 40);
        put(&cache, "b", 40);
        put(&cache, "c", 40);

        // Reading `a` makes `b` the oldest.
        assert!(cache.get(&key("a")).is_some());
        put(&cache, "d", 40);

        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
        assert!(cache.contains(&key("d")));
        assert_eq!(cache.resident_bytes(), ByteSize::from_bytes(120));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn eviction_frees_enough_for_large_insert() {
        let cache = ImageCache::new(ByteSize::from_bytes(100));
        put(&cache, "a", 32);
        put(&cache, "b", 32);
        put(&cache, "c", 32);
        put(&cache, "big", 80);

        assert!(cache.contains(&key("big")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resident_bytes(), ByteSize::from_bytes(80));
    }

    #[test]
    fn oversize_artifacts_are_not_cached() {
        let cache = ImageCache::new(ByteSize::from_bytes(64));
        put(&cache, "a", 40);
        put(&cache, "huge", 128);

        assert!(!cache.contains(&key("huge")));
        assert!(cache.contains(&key("a")));
        assert_eq!(cache.stats().rejected_oversize, 1);
    }

    #[test]
    fn replacing_a_key_reconciles_bytes() {
        let cache = ImageCache::new(ByteSize::from_bytes(100));
        put(&cache, "a", 40);
        put(&cache, "a", 20);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resident_bytes(), ByteSize::from_bytes(20));
        assert_eq!(cache.get(&key("a")).map(|i| i.width()), Some(5));
    }

    #[test]
    fn invalidate_and_clear_release_bytes() {
        let cache = ImageCache::new(ByteSize::from_bytes(100));
        put(&cache, "a", 40);
        put(&cache, "b", 40);

        assert!(cache.invalidate(&key("a")));
        assert!(!cache.invalidate(&key("a")));
        assert_eq!(cache.resident_bytes(), ByteSize::from_bytes(40));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.resident_bytes(), ByteSize::ZERO);
    }

    #[test]
    fn get_refreshes_last_accessed() {
        let cache = ImageCache::new(ByteSize::from_bytes(100));
        put(&cache, "a", 4);
        let before = cache.last_accessed(&key("a")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        cache.get(&key("a"));
        assert!(cache.last_accessed(&key("a")).unwrap() > before);
    }

    #[test]
    fn reads_share_the_shard_with_other_readers() {
        let cache = ImageCache::new(ByteSize::from_bytes(100));
        put(&cache, "a", 4);
        let before = cache.last_accessed(&key("a")).unwrap();
        let tick_before = cache.entries.get(&key("a")).unwrap().tick();

        // A lookup must not need exclusive access while another reader holds
        // the entry.
        let held = cache.entries.get(&key("a")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(cache.get(&key("a")).is_some());
        assert!(held.tick() > tick_before);
        drop(held);

        assert!(cache.last_accessed(&key("a")).unwrap() > before);
    }

    #[test]
    fn shrinking_the_budget_evicts_oldest() {
        let cache = ImageCache::new(ByteSize::from_bytes(100));
        put(&cache, "a", 40);
        put(&cache, "b", 40);
        cache.set_budget(ByteSize::from_bytes(50));

        assert!(!cache.contains(&key("a")));
        assert!(cache.contains(&key("b")));
    }

    #[test]
    fn concurrent_puts_for_one_key_keep_accounting_consistent() {
        let cache = Arc::new(ImageCache::new(ByteSize::from_kib(64)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for round in 0..200 {
                        let bytes = 4 * (1 + ((i + round) % 16));
                        put(&cache, "shared", bytes);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = cache.get(&key("shared")).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resident_bytes(), stored.size_bytes());
    }
}
