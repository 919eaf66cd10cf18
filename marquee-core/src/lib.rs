//! # Marquee Core
//!
//! Artwork caching and list reconciliation for media browsing surfaces.
//!
//! ## Overview
//!
//! - **Artwork resolution**: [`image::MediaKeyResolver`] turns media entities
//!   into sized remote locators and stable [`image::CacheKey`]s
//! - **Caching**: [`image::ImageCache`] keeps decoded artwork under an LRU
//!   byte budget; [`image::DiskImageStore`] optionally keeps encoded bytes
//!   across runs
//! - **Fetching**: [`image::ImageFetcher`] serves from cache, coalesces
//!   concurrent misses onto one retrieval and bounds each load with a timeout
//! - **Cell binding**: [`binding::ArtworkCell`] guarantees a reused cell only
//!   ever shows artwork for its most recent bind
//! - **Lists**: [`sort::SortPolicy`] and [`list::diff`] are pure functions;
//!   [`list::ListSyncEngine`] applies them to a view and
//!   [`list::TrackedList`] layers optimistic edits with rollback on top
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use marquee_core::image::{HttpImageSource, ImageCache, ImageFetcher, MediaKeyResolver};
//! use marquee_model::{MediaEntity, TmdbId};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(ImageCache::default());
//! let fetcher = ImageFetcher::builder(cache, Arc::new(HttpImageSource::default())).build();
//!
//! let movie = MediaEntity::Movie {
//!     tmdb_id: TmdbId(603),
//!     title: "The Matrix".into(),
//!     poster_path: Some("/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg".into()),
//! };
//! if let Some(artwork) = MediaKeyResolver::default().resolve(&movie)? {
//!     let result = fetcher.fetch(&artwork.locator).await?;
//!     println!("{}x{} via {:?}", result.artifact.width(), result.artifact.height(), result.provenance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod error;
pub mod image;
pub mod list;
pub mod sort;
pub mod units;

pub use error::{
    CoreError, ImageUnavailable, PersistenceFailure, Result, SnapshotError,
    ViewRejected,
};
pub use units::ByteSize;
