//! Cache-first artwork fetcher with per-key request coalescing.
//!
//! Concurrent fetches for the same key share one in-flight operation: the
//! first caller registers a shared handle in `pending` and spawns the load,
//! later callers clone the handle and await the same result (or failure).
//! The load runs on its own task so a caller dropping its future never
//! strands the other waiters. A load only publishes into the cache tiers
//! while it is still the registered load for its key, so invalidation wins
//! over a load that was already in flight.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared, join_all},
};
use marquee_model::ImageLocator;
use tracing::{debug, warn};

use super::{
    artifact::{DecodedImage, ImageDecoder, RasterDecoder},
    disk::DiskImageStore,
    key::CacheKey,
    memory_cache::ImageCache,
    source::RemoteImageSource,
    stats::{FetcherStats, FetcherStatsSnapshot},
};
use crate::{error::ImageUnavailable, units::ByteSize};

/// Where a returned artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Memory or disk cache; safe to show without a transition.
    Cache,
    /// A fresh network retrieval; presented with a cross-fade.
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub artifact: DecodedImage,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Upper bound for a whole cache-miss load (disk, network and decode).
    pub timeout: Duration,
    /// Payloads above this size are decoded on the blocking pool.
    pub blocking_decode_threshold: ByteSize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            blocking_decode_threshold: ByteSize::from_kib(64),
        }
    }
}

type LoadOutcome = Result<(DecodedImage, Provenance), ImageUnavailable>;
type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

enum Loaded {
    Ready(DecodedImage, Provenance),
    /// Fresh from the network, with the encoded bytes for the disk tier.
    Retrieved(DecodedImage, Vec<u8>),
}

struct PendingLoad {
    id: u64,
    load: SharedLoad,
}

/// Unregisters a load when its task ends, including by panic.
struct PendingGuard<'a> {
    pending: &'a DashMap<CacheKey, PendingLoad>,
    key: &'a CacheKey,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .remove_if(self.key, |_, pending| pending.id == self.id);
    }
}

struct FetcherInner {
    cache: Arc<ImageCache>,
    disk: Option<Arc<DiskImageStore>>,
    source: Arc<dyn RemoteImageSource>,
    decoder: Arc<dyn ImageDecoder>,
    policy: FetchPolicy,
    pending: DashMap<CacheKey, PendingLoad>,
    next_load_id: AtomicU64,
    stats: FetcherStats,
}

/// Resolves locators to decoded artwork. Cheap to clone.
#[derive(Clone)]
pub struct ImageFetcher {
    inner: Arc<FetcherInner>,
}

impl fmt::Debug for ImageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFetcher")
            .field("cache", &self.inner.cache)
            .field("disk", &self.inner.disk.as_ref().map(|d| d.root().to_path_buf()))
            .field("source", &self.inner.source)
            .field("decoder", &self.inner.decoder)
            .field("policy", &self.inner.policy)
            .field("in_flight", &self.inner.pending.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct ImageFetcherBuilder {
    cache: Arc<ImageCache>,
    source: Arc<dyn RemoteImageSource>,
    disk: Option<Arc<DiskImageStore>>,
    decoder: Arc<dyn ImageDecoder>,
    policy: FetchPolicy,
}

impl ImageFetcherBuilder {
    pub fn disk(mut self, store: Arc<DiskImageStore>) -> Self {
        self.disk = Some(store);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> ImageFetcher {
        ImageFetcher {
            inner: Arc::new(FetcherInner {
                cache: self.cache,
                disk: self.disk,
                source: self.source,
                decoder: self.decoder,
                policy: self.policy,
                pending: DashMap::new(),
                next_load_id: AtomicU64::new(0),
                stats: FetcherStats::default(),
            }),
        }
    }
}

impl ImageFetcher {
    pub fn builder(
        cache: Arc<ImageCache>,
        source: Arc<dyn RemoteImageSource>,
    ) -> ImageFetcherBuilder {
        ImageFetcherBuilder {
            cache,
            source,
            disk: None,
            decoder: Arc::new(RasterDecoder),
            policy: FetchPolicy::default(),
        }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.inner.cache
    }

    pub fn policy(&self) -> FetchPolicy {
        self.inner.policy
    }

    pub fn stats(&self) -> FetcherStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Number of distinct keys with a load currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.pending.len()
    }

    /// Resolve `locator` to an artifact.
    ///
    /// Memory hits return without suspending. Misses join (or start) the
    /// single in-flight load for the key. Failures are not cached, so a later
    /// call retries.
    pub async fn fetch(
        &self,
        locator: &ImageLocator,
    ) -> Result<FetchResult, ImageUnavailable> {
        let key = CacheKey::for_locator(locator);
        if let Some(artifact) = self.inner.cache.get(&key) {
            self.inner.stats.on_memory_hit();
            return Ok(FetchResult {
                artifact,
                provenance: Provenance::Cache,
            });
        }

        let (artifact, provenance) = self.join_or_start(key, locator).await?;
        Ok(FetchResult {
            artifact,
            provenance,
        })
    }

    /// Warm the cache for several locators concurrently.
    pub async fn prefetch<I>(
        &self,
        locators: I,
    ) -> Vec<(ImageLocator, Result<Provenance, ImageUnavailable>)>
    where
        I: IntoIterator<Item = ImageLocator>,
    {
        let loads = locators.into_iter().map(|locator| async move {
            let outcome = self.fetch(&locator).await.map(|r| r.provenance);
            (locator, outcome)
        });
        join_all(loads).await
    }

    /// Drop one artwork from memory and disk.
    ///
    /// A load already in flight for it still answers its waiters but no
    /// longer writes to either tier.
    pub async fn invalidate(&self, locator: &ImageLocator) {
        let key = CacheKey::for_locator(locator);
        if self.inner.pending.remove(&key).is_some() {
            debug!("image fetch for {} detached by invalidation", key);
        }
        self.inner.cache.invalidate(&key);
        if let Some(disk) = &self.inner.disk
            && let Err(e) = disk.remove(&key).await
        {
            warn!("disk image cache: failed to invalidate {key}: {e}");
        }
    }

    /// Drop all cached artwork from memory and disk.
    pub async fn clear(&self) {
        self.inner.pending.clear();
        self.inner.cache.clear();
        if let Some(disk) = &self.inner.disk
            && let Err(e) = disk.clear().await
        {
            warn!("disk image cache: failed to clear: {e}");
        }
    }

    fn join_or_start(&self, key: CacheKey, locator: &ImageLocator) -> SharedLoad {
        match self.inner.pending.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                let waiters = self.inner.stats.on_coalesced();
                debug!("singleflight wait: key={}, waiters={}", key, waiters);
                occupied.get().load.clone()
            }
            Entry::Vacant(vacant) => {
                // A previous leader may have filled the cache after our miss.
                if let Some(artifact) = self.inner.cache.get(&key) {
                    self.inner.stats.on_memory_hit();
                    return futures::future::ready(Ok((artifact, Provenance::Cache)))
                        .boxed()
                        .shared();
                }

                let id = self.inner.next_load_id.fetch_add(1, Ordering::Relaxed);
                let inner = Arc::clone(&self.inner);
                let task_key = key.clone();
                let task_locator = locator.clone();
                let handle = tokio::spawn(async move {
                    inner.load(task_key, task_locator, id).await
                });
                let load = async move {
                    handle.await.unwrap_or_else(|e| {
                        Err(ImageUnavailable::Aborted(e.to_string()))
                    })
                }
                .boxed()
                .shared();

                debug!("singleflight lead: key={}", key);
                vacant.insert(PendingLoad {
                    id,
                    load: load.clone(),
                });
                load
            }
        }
    }
}

impl FetcherInner {
    async fn load(&self, key: CacheKey, locator: ImageLocator, id: u64) -> LoadOutcome {
        let _registration = PendingGuard {
            pending: &self.pending,
            key: &key,
            id,
        };

        let timeout = self.policy.timeout;
        let loaded = tokio::time::timeout(timeout, self.load_uncached(&key, &locator))
            .await
            .unwrap_or(Err(ImageUnavailable::Timeout(timeout)));

        match loaded {
            Ok(Loaded::Ready(artifact, provenance)) => {
                self.publish(&key, id, &artifact);
                Ok((artifact, provenance))
            }
            Ok(Loaded::Retrieved(artifact, encoded)) => {
                // Written before the key leaves `pending`, outside the timeout.
                if self.publish(&key, id, &artifact) {
                    self.persist(&key, id, &encoded).await;
                }
                Ok((artifact, Provenance::Network))
            }
            Err(err) => {
                self.stats
                    .on_failure(matches!(err, ImageUnavailable::Timeout(_)));
                debug!("image fetch failed for {}: {}", locator, err);
                Err(err)
            }
        }
    }

    fn is_registered(&self, key: &CacheKey, id: u64) -> bool {
        self.pending.get(key).is_some_and(|pending| pending.id == id)
    }

    /// Insert into memory if load `id` still owns `key`.
    ///
    /// The check and the insert happen under the `pending` shard lock, so an
    /// invalidation either sees the entry and removes it afterwards or
    /// detaches the load before the insert.
    fn publish(&self, key: &CacheKey, id: u64, artifact: &DecodedImage) -> bool {
        match self.pending.get(key) {
            Some(pending) if pending.id == id => {
                self.cache
                    .put(key.clone(), artifact.clone(), artifact.size_bytes());
                true
            }
            _ => {
                debug!("image fetch for {} invalidated in flight", key);
                false
            }
        }
    }

    async fn persist(&self, key: &CacheKey, id: u64, encoded: &[u8]) {
        let Some(disk) = &self.disk else {
            return;
        };
        if let Err(e) = disk.write(key, encoded).await {
            warn!("disk image cache: write failed for {key}: {e}");
            return;
        }
        if !self.is_registered(key, id)
            && let Err(e) = disk.remove(key).await
        {
            debug!("disk image cache: cleanup of invalidated {key} failed: {e}");
        }
    }

    async fn load_uncached(
        &self,
        key: &CacheKey,
        locator: &ImageLocator,
    ) -> Result<Loaded, ImageUnavailable> {
        if let Some(disk) = &self.disk {
            match disk.read(key).await {
                Ok(Some(bytes)) => match self.decode(bytes).await {
                    Ok((artifact, _)) => {
                        self.stats.on_disk_hit();
                        return Ok(Loaded::Ready(artifact, Provenance::Cache));
                    }
                    Err(e) => {
                        warn!("disk image cache: undecodable entry {key}: {e}");
                        if let Err(e) = disk.remove(key).await {
                            debug!("disk image cache: cleanup of {key} failed: {e}");
                        }
                    }
                },
                Ok(None) => {}
                Err(e) => warn!("disk image cache: read failed for {key}: {e}"),
            }
        }

        self.stats.on_network_retrieval();
        let bytes = self.source.retrieve(locator).await?;
        let (artifact, bytes) = self.decode(bytes).await?;
        Ok(Loaded::Retrieved(artifact, bytes))
    }

    /// Decode, moving large payloads onto the blocking pool.
    ///
    /// The encoded bytes are handed back for the disk tier.
    async fn decode(
        &self,
        bytes: Vec<u8>,
    ) -> Result<(DecodedImage, Vec<u8>), ImageUnavailable> {
        let threshold = self.policy.blocking_decode_threshold;
        if ByteSize::from_usize(bytes.len()) <= threshold {
            let artifact = self.decoder.decode(&bytes)?;
            return Ok((artifact, bytes));
        }

        let decoder = Arc::clone(&self.decoder);
        let (decoded, bytes) = tokio::task::spawn_blocking(move || {
            let decoded = decoder.decode(&bytes);
            (decoded, bytes)
        })
        .await
        .map_err(|e| ImageUnavailable::Aborted(format!("decode task failed: {e}")))?;
        Ok((decoded?, bytes))
    }
}
