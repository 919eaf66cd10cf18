use std::{path::PathBuf, time::Duration};

use marquee_core::{
    ByteSize,
    image::{
        DEFAULT_ARTWORK_BASE_URL, DEFAULT_MEMORY_BUDGET, DiskCacheLimits, FetchPolicy,
        MediaKeyResolver,
    },
};
use marquee_model::{PosterSize, StillSize};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{loader::ConfigLoadError, util::humantime_duration};

/// Top-level settings. Every section falls back to its defaults, so an empty
/// file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub image_cache: ImageCacheConfig,
    pub fetch: FetchConfig,
    pub artwork: ArtworkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageCacheConfig {
    /// Decoded bytes kept in memory before least-recently-used artwork is
    /// evicted.
    pub memory_budget_bytes: u64,
    /// On-disk tier for encoded artwork. Disabled when absent.
    pub disk: Option<DiskCacheConfig>,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET.as_bytes(),
            disk: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiskCacheConfig {
    pub root: PathBuf,
    /// Size cap applied by maintenance; `0` disables it.
    pub max_bytes: u64,
    /// Age after which entries are dropped by maintenance; `0s` disables it.
    #[serde(with = "humantime_duration")]
    pub ttl: Duration,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        let limits = DiskCacheLimits::default();
        Self {
            root: PathBuf::from("cache/artwork"),
            max_bytes: limits.max_bytes.as_bytes(),
            ttl: limits.ttl,
        }
    }
}

impl DiskCacheConfig {
    pub fn limits(&self) -> DiskCacheLimits {
        DiskCacheLimits {
            max_bytes: ByteSize::from_bytes(self.max_bytes),
            ttl: self.ttl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound for one artwork load, e.g. `"15s"` or `"1m 30s"`.
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
    /// Payloads larger than this are decoded on the blocking pool.
    pub blocking_decode_threshold_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let policy = FetchPolicy::default();
        Self {
            timeout: policy.timeout,
            blocking_decode_threshold_bytes: policy.blocking_decode_threshold.as_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtworkConfig {
    pub base_url: String,
    pub poster_size: PosterSize,
    pub still_size: StillSize,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ARTWORK_BASE_URL.to_string(),
            poster_size: PosterSize::default(),
            still_size: StillSize::default(),
        }
    }
}

/// Memory and disk cache sizing derived from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLimits {
    pub memory_budget: ByteSize,
    pub disk: Option<(PathBuf, DiskCacheLimits)>,
}

impl Config {
    /// Reject settings the core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.image_cache.memory_budget_bytes == 0 {
            return Err(ConfigLoadError::Invalid(
                "image_cache.memory_budget_bytes must be greater than zero".into(),
            ));
        }
        if self.fetch.timeout.is_zero() {
            return Err(ConfigLoadError::Invalid(
                "fetch.timeout must be greater than zero".into(),
            ));
        }
        if let Some(disk) = &self.image_cache.disk
            && disk.root.as_os_str().is_empty()
        {
            return Err(ConfigLoadError::Invalid(
                "image_cache.disk.root must not be empty".into(),
            ));
        }
        self.resolver().map(|_| ())
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: self.fetch.timeout,
            blocking_decode_threshold: ByteSize::from_bytes(
                self.fetch.blocking_decode_threshold_bytes,
            ),
        }
    }

    pub fn cache_limits(&self) -> CacheLimits {
        CacheLimits {
            memory_budget: ByteSize::from_bytes(self.image_cache.memory_budget_bytes),
            disk: self
                .image_cache
                .disk
                .as_ref()
                .map(|disk| (disk.root.clone(), disk.limits())),
        }
    }

    pub fn resolver(&self) -> Result<MediaKeyResolver, ConfigLoadError> {
        let base_url = Url::parse(self.artwork.base_url.trim()).map_err(|e| {
            ConfigLoadError::Invalid(format!(
                "artwork.base_url {:?} is not a url: {e}",
                self.artwork.base_url
            ))
        })?;
        MediaKeyResolver::new(base_url, self.artwork.poster_size, self.artwork.still_size)
            .map_err(|e| ConfigLoadError::Invalid(format!("artwork.base_url: {e}")))
    }
}
