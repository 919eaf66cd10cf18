pub mod locator;
pub mod sizes;

pub use locator::ImageLocator;
pub use sizes::{ImageSize, PosterSize, StillSize};
