//! Core data model definitions shared across Marquee crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod image;
pub mod media;
pub mod prelude;
pub mod tracked;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use ids::{EpisodeKey, SeasonKey, TmdbId, TrackedItemId};
pub use image::{ImageLocator, ImageSize, PosterSize, StillSize};
pub use media::{MediaEntity, MediaType};
pub use tracked::{TrackedItem, TrackingState};
