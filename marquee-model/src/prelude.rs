//! UI focused snapshot of the model surface.
//! Prefer importing from this module when working in list or cell code.

pub use super::ids::{EpisodeKey, SeasonKey, TmdbId, TrackedItemId};
pub use super::image::{ImageLocator, ImageSize, PosterSize, StillSize};
pub use super::media::{MediaEntity, MediaType};
pub use super::tracked::{TrackedItem, TrackingState};
