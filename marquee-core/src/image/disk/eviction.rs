//! Maintenance planning for the disk tier.
//!
//! Expiry counts from the write. The size cap drops the least recently used
//! entries, where use is the later of the write and the last read this
//! process served.

use std::cmp::Reverse;

use super::DiskCacheLimits;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntryInfo {
    pub key: String,
    /// Content address; identical payloads share one blob.
    pub integrity: String,
    pub size_bytes: u64,
    pub written_ms: u64,
    pub read_ms: Option<u64>,
}

impl DiskEntryInfo {
    pub fn last_used_ms(&self) -> u64 {
        self.read_ms
            .map_or(self.written_ms, |read| read.max(self.written_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Expired,
    OverCapacity,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    /// Expired entries first, then capacity victims from least recently used.
    pub evict: Vec<(DiskEntryInfo, EvictionReason)>,
    pub retain: Vec<DiskEntryInfo>,
}

impl EvictionPlan {
    pub fn count(&self, reason: EvictionReason) -> usize {
        self.evict.iter().filter(|(_, r)| *r == reason).count()
    }

    pub fn retained_bytes(&self) -> u64 {
        self.retain.iter().map(|e| e.size_bytes).sum()
    }
}

/// Split `entries` into what maintenance removes and what it keeps.
///
/// A zero TTL or byte cap disables that rule.
pub fn plan_evictions(
    entries: Vec<DiskEntryInfo>,
    now_ms: u64,
    limits: &DiskCacheLimits,
) -> EvictionPlan {
    let ttl_ms = u64::try_from(limits.ttl.as_millis()).unwrap_or(u64::MAX);
    let (expired, mut retain): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| ttl_ms > 0 && now_ms.saturating_sub(e.written_ms) > ttl_ms);

    let mut evict: Vec<_> = expired
        .into_iter()
        .map(|e| (e, EvictionReason::Expired))
        .collect();

    let cap = limits.max_bytes.as_bytes();
    let mut retained: u64 = retain.iter().map(|e| e.size_bytes).sum();
    if cap > 0 && retained > cap {
        // Most recent first, so victims pop off the tail.
        retain.sort_by_key(|e| Reverse((e.last_used_ms(), e.written_ms)));
        while retained > cap {
            let Some(victim) = retain.pop() else { break };
            retained = retained.saturating_sub(victim.size_bytes);
            evict.push((victim, EvictionReason::OverCapacity));
        }
    }

    EvictionPlan { evict, retain }
}
