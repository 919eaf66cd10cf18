//! Shared configuration library for Marquee.
//!
//! Loads [`Config`] from the environment or a config file, validates it, and
//! converts it into the core's fetch policy, cache limits and artwork
//! resolver. Also hosts the tracing setup used by the binaries.

pub mod loader;
pub mod models;
pub mod telemetry;
pub mod util;

pub use loader::{CONFIG_JSON_ENV, CONFIG_PATH_ENV, ConfigLoadError, ConfigSource};
pub use models::{
    ArtworkConfig, CacheLimits, Config, DiskCacheConfig, FetchConfig, ImageCacheConfig,
};
pub use telemetry::{DEFAULT_LOG_DIRECTIVES, init_tracing};
