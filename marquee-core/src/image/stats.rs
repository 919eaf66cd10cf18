use std::sync::atomic::{AtomicU64, Ordering};

use crate::units::ByteSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub rejected_oversize: u64,
    pub entries: usize,
    pub resident: ByteSize,
}

impl ImageCacheStatsSnapshot {
    /// Fraction of lookups served from memory (0.0-1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct ImageCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
    rejected_oversize: AtomicU64,
}

impl ImageCacheStats {
    pub fn on_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_insert(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_evicted(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn on_rejected(&self) {
        self.rejected_oversize.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(
        &self,
        entries: usize,
        resident: ByteSize,
    ) -> ImageCacheStatsSnapshot {
        ImageCacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            rejected_oversize: self.rejected_oversize.load(Ordering::Relaxed),
            entries,
            resident,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetcherStatsSnapshot {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub network_retrievals: u64,
    pub coalesced_waiters: u64,
    pub failures: u64,
    pub timeouts: u64,
}

#[derive(Debug, Default)]
pub struct FetcherStats {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    network_retrievals: AtomicU64,
    coalesced_waiters: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

impl FetcherStats {
    pub fn on_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_network_retrieval(&self) {
        self.network_retrievals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_coalesced(&self) -> u64 {
        self.coalesced_waiters.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn on_failure(&self, timed_out: bool) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> FetcherStatsSnapshot {
        FetcherStatsSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            network_retrievals: self.network_retrievals.load(Ordering::Relaxed),
            coalesced_waiters: self.coalesced_waiters.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}
