//! Artwork pipeline: locator resolution, memory and disk caches, the remote
//! source seam and the coalescing fetcher.

pub mod artifact;
pub mod disk;
pub mod fetcher;
pub mod key;
pub mod memory_cache;
pub mod source;
pub mod stats;

pub use artifact::{DecodedImage, ImageDecoder, RasterDecoder};
pub use disk::{DiskCacheLimits, DiskImageStore, DiskMaintenanceReport};
pub use fetcher::{
    FetchPolicy, FetchResult, ImageFetcher, ImageFetcherBuilder, Provenance,
};
pub use key::{
    CacheKey, DEFAULT_ARTWORK_BASE_URL, MediaKeyResolver, ResolvedArtwork,
};
pub use memory_cache::{DEFAULT_MEMORY_BUDGET, ImageCache};
pub use source::{HttpImageSource, RemoteImageSource};
pub use stats::{FetcherStatsSnapshot, ImageCacheStatsSnapshot};
