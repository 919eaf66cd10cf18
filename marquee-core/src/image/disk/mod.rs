//! Optional on-disk tier for encoded artwork.
//!
//! A thin typed wrapper over `cacache`: blobs are content-addressed and
//! integrity-checked, indexed by [`CacheKey`]. The store is private to the
//! image cache; its layout is not a compatibility surface.

mod eviction;

pub use eviction::{DiskEntryInfo, EvictionPlan, EvictionReason, plan_evictions};

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::key::CacheKey;
use crate::{
    error::{CoreError, Result},
    units::ByteSize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskCacheLimits {
    pub max_bytes: ByteSize,
    /// Entries written longer ago than this are dropped on maintenance.
    pub ttl: Duration,
}

impl Default for DiskCacheLimits {
    fn default() -> Self {
        Self {
            max_bytes: ByteSize::from_gib(1),
            ttl: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// Summary of one [`DiskImageStore::enforce_limits`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskMaintenanceReport {
    pub scanned: usize,
    pub removed_ttl: usize,
    pub removed_size: usize,
    pub bytes_after: ByteSize,
}

#[derive(Debug)]
pub struct DiskImageStore {
    root: PathBuf,
    limits: DiskCacheLimits,
    /// Unix-ms of the last read served per key, for recency-aware eviction.
    reads: DashMap<String, u64>,
    maintenance_lock: Mutex<()>,
}

impl DiskImageStore {
    pub fn open(root: impl Into<PathBuf>, limits: DiskCacheLimits) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            CoreError::DiskCache(format!(
                "failed to create cache root {}: {e}",
                root.display()
            ))
        })?;
        Ok(Self {
            root,
            limits,
            reads: DashMap::new(),
            maintenance_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> DiskCacheLimits {
        self.limits
    }

    /// Read the encoded bytes for `key`.
    ///
    /// Missing entries are `Ok(None)`. Entries that fail the integrity check
    /// are removed and also reported as missing.
    pub async fn read(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        match cacache::read(&self.root, key.as_str()).await {
            Ok(bytes) => {
                self.reads.insert(key.as_str().to_owned(), unix_ms_now());
                Ok(Some(bytes))
            }
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(
                err @ (cacache::Error::IntegrityError(_)
                | cacache::Error::SizeMismatch(_, _)),
            ) => {
                warn!("disk image cache: dropping corrupt entry {key}: {err}");
                if let Err(e) = self.remove(key).await {
                    debug!("disk image cache: cleanup of {key} failed: {e}");
                }
                Ok(None)
            }
            Err(err) => Err(CoreError::DiskCache(format!(
                "cacache read failed for {key}: {err}"
            ))),
        }
    }

    pub async fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        cacache::write(&self.root, key.as_str(), bytes)
            .await
            .map(|_integrity| ())
            .map_err(|e| {
                CoreError::DiskCache(format!("cacache write failed for {key}: {e}"))
            })
    }

    /// Drop the index entry for `key`.
    ///
    /// The content blob may back other keys with identical bytes, so it is
    /// left for [`clear`](Self::clear) or maintenance to reclaim.
    pub async fn remove(&self, key: &CacheKey) -> Result<()> {
        self.reads.remove(key.as_str());
        cacache::index::RemoveOpts::new()
            .remove_fully(false)
            .remove(&self.root, key.as_str())
            .await
            .map_err(|e| {
                CoreError::DiskCache(format!("cacache remove failed for {key}: {e}"))
            })
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.maintenance_lock.lock().await;
        self.reads.clear();
        cacache::clear(&self.root).await.map_err(|e| {
            CoreError::DiskCache(format!("cacache clear failed: {e}"))
        })
    }

    /// Apply TTL and size limits to the on-disk index.
    pub async fn enforce_limits(&self) -> Result<DiskMaintenanceReport> {
        let _guard = self.maintenance_lock.lock().await;

        let root = self.root.clone();
        let mut entries = tokio::task::spawn_blocking(move || list_entries(&root))
            .await
            .map_err(|e| {
                CoreError::DiskCache(format!("disk scan task failed: {e}"))
            })??;
        for entry in &mut entries {
            entry.read_ms = self.reads.get(&entry.key).map(|read| *read);
        }
        let scanned = entries.len();

        let plan = plan_evictions(entries, unix_ms_now(), &self.limits);

        // A blob is deleted only with the last index entry that points at it.
        let mut referenced: HashSet<&str> =
            plan.retain.iter().map(|e| e.integrity.as_str()).collect();
        for (entry, reason) in &plan.evict {
            let last_reference = referenced.insert(entry.integrity.as_str());
            let removal = cacache::index::RemoveOpts::new()
                .remove_fully(last_reference)
                .remove(&self.root, &entry.key)
                .await;
            match removal {
                Ok(()) => {
                    self.reads.remove(&entry.key);
                }
                Err(e) => warn!(
                    "disk image cache: failed to evict {} ({:?}): {e}",
                    entry.key, reason
                ),
            }
        }

        let report = DiskMaintenanceReport {
            scanned,
            removed_ttl: plan.count(EvictionReason::Expired),
            removed_size: plan.count(EvictionReason::OverCapacity),
            bytes_after: ByteSize::from_bytes(plan.retained_bytes()),
        };
        if !plan.evict.is_empty() {
            info!(
                "disk image cache: removed {} expired and {} over-cap entries => {}",
                report.removed_ttl, report.removed_size, report.bytes_after
            );
        }
        Ok(report)
    }
}

fn list_entries(root: &Path) -> Result<Vec<DiskEntryInfo>> {
    let mut entries = Vec::new();
    for meta in cacache::list_sync(root) {
        let meta = meta.map_err(|e| {
            CoreError::DiskCache(format!("cacache index scan failed: {e}"))
        })?;
        entries.push(DiskEntryInfo {
            key: meta.key,
            integrity: meta.integrity.to_string(),
            size_bytes: meta.size as u64,
            written_ms: u64::try_from(meta.time).unwrap_or(u64::MAX),
            read_ms: None,
        });
    }
    Ok(entries)
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::ImageLocator;

    fn key(name: &str) -> CacheKey {
        CacheKey::for_locator(
            &ImageLocator::parse(&format!("https://img.test/{name}.jpg")).unwrap(),
        )
    }

    #[tokio::test]
    async fn write_read_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::open(dir.path(), DiskCacheLimits::default())
            .unwrap();

        assert_eq!(store.read(&key("a")).await.unwrap(), None);
        store.write(&key("a"), b"encoded").await.unwrap();
        assert_eq!(
            store.read(&key("a")).await.unwrap().as_deref(),
            Some(&b"encoded"[..])
        );

        store.remove(&key("a")).await.unwrap();
        assert_eq!(store.read(&key("a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn size_cap_drops_oldest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let limits = DiskCacheLimits {
            max_bytes: ByteSize::from_bytes(10),
            ttl: Duration::ZERO,
        };
        let store = DiskImageStore::open(dir.path(), limits).unwrap();

        store.write(&key("first"), &[1u8; 8]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.write(&key("second"), &[2u8; 8]).await.unwrap();

        let report = store.enforce_limits().await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.removed_size, 1);
        assert_eq!(store.read(&key("first")).await.unwrap(), None);
        assert!(store.read(&key("second")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn removing_one_key_keeps_identical_siblings_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::open(dir.path(), DiskCacheLimits::default())
            .unwrap();
        store.write(&key("a"), b"same bytes").await.unwrap();
        store.write(&key("b"), b"same bytes").await.unwrap();

        store.remove(&key("a")).await.unwrap();

        assert_eq!(store.read(&key("a")).await.unwrap(), None);
        assert_eq!(
            store.read(&key("b")).await.unwrap().as_deref(),
            Some(&b"same bytes"[..])
        );
    }

    #[tokio::test]
    async fn evicting_a_duplicate_keeps_the_shared_blob() {
        let dir = tempfile::tempdir().unwrap();
        let limits = DiskCacheLimits {
            max_bytes: ByteSize::from_bytes(10),
            ttl: Duration::ZERO,
        };
        let store = DiskImageStore::open(dir.path(), limits).unwrap();
        store.write(&key("first"), &[7u8; 8]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.write(&key("second"), &[7u8; 8]).await.unwrap();

        let report = store.enforce_limits().await.unwrap();

        assert_eq!(report.removed_size, 1);
        assert_eq!(store.read(&key("first")).await.unwrap(), None);
        assert!(store.read(&key("second")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn recently_read_entries_survive_the_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let limits = DiskCacheLimits {
            max_bytes: ByteSize::from_bytes(10),
            ttl: Duration::ZERO,
        };
        let store = DiskImageStore::open(dir.path(), limits).unwrap();
        store.write(&key("older"), &[1u8; 8]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.write(&key("newer"), &[2u8; 8]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.read(&key("older")).await.unwrap().is_some());

        let report = store.enforce_limits().await.unwrap();

        assert_eq!(report.removed_size, 1);
        assert!(store.read(&key("older")).await.unwrap().is_some());
        assert_eq!(store.read(&key("newer")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::open(dir.path(), DiskCacheLimits::default())
            .unwrap();
        store.write(&key("a"), b"x").await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.read(&key("a")).await.unwrap(), None);
    }
}
