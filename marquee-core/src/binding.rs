//! Identity-safe artwork binding for reusable cells.
//!
//! A cell is reassigned to different items as a list scrolls, while artwork
//! loads finish in arbitrary order. Each `bind` mints a new [`BindingToken`]
//! and the load carries the token it was started with. When the load comes
//! back, [`ArtworkCell::resolve`] applies it only if the token still matches
//! the cell's current one; anything else is dropped without touching the
//! surface.
//!
//! The cell itself never awaits. The host runs [`ArtworkRequest::load`] on
//! whatever executor it likes and feeds the resulting [`ArtworkLoaded`] back
//! on the context that owns the cell.

use marquee_model::ImageLocator;
use tracing::trace;

use crate::{
    error::ImageUnavailable,
    image::{DecodedImage, FetchResult, ImageFetcher, Provenance},
};

/// Generation counter issued by a cell on every bind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingToken {
    generation: u64,
}

impl BindingToken {
    pub fn generation(self) -> u64 {
        self.generation
    }

    fn next(self) -> Self {
        Self {
            generation: self.generation.wrapping_add(1),
        }
    }
}

/// How an artifact is put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Immediate,
    CrossFade,
}

impl From<Provenance> for Presentation {
    fn from(provenance: Provenance) -> Self {
        match provenance {
            Provenance::Cache => Presentation::Immediate,
            Provenance::Network => Presentation::CrossFade,
        }
    }
}

/// Lifecycle of one cell.
///
/// A superseded cycle has no state of its own: the new `bind` moves the cell
/// straight to `Pending` with the next generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindingState {
    #[default]
    Idle,
    Pending(BindingToken),
    Applied(BindingToken),
    Failed(BindingToken),
}

/// Rendering side of a cell.
pub trait ArtworkSurface {
    fn show_placeholder(&mut self);

    fn show_artwork(&mut self, artifact: &DecodedImage, presentation: Presentation);

    /// The load failed; the placeholder stays up.
    fn show_unavailable(&mut self, _error: &ImageUnavailable) {}
}

/// A load the host should run for a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkRequest {
    pub token: BindingToken,
    pub locator: ImageLocator,
}

impl ArtworkRequest {
    pub async fn load(self, fetcher: &ImageFetcher) -> ArtworkLoaded {
        let outcome = fetcher.fetch(&self.locator).await;
        ArtworkLoaded {
            token: self.token,
            outcome,
        }
    }
}

/// Completion of an [`ArtworkRequest`], delivered back to the cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkLoaded {
    pub token: BindingToken,
    pub outcome: Result<FetchResult, ImageUnavailable>,
}

/// What [`ArtworkCell::resolve`] did with a completion.
#[derive(Debug, Clone, PartialEq)]
pub enum BindOutcome {
    Applied(Presentation),
    /// The completion belonged to an earlier bind.
    Discarded,
    Failed(ImageUnavailable),
}

#[derive(Debug)]
pub struct ArtworkCell<S> {
    surface: S,
    current: BindingToken,
    state: BindingState,
    locator: Option<ImageLocator>,
}

impl<S: ArtworkSurface> ArtworkCell<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            current: BindingToken::default(),
            state: BindingState::Idle,
            locator: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn token(&self) -> BindingToken {
        self.current
    }

    pub fn locator(&self) -> Option<&ImageLocator> {
        self.locator.as_ref()
    }

    /// Assign the cell to an item's artwork.
    ///
    /// Clears the surface and starts a new generation. Returns the load to run,
    /// or `None` when the item has no artwork, in which case the cell rests on
    /// its placeholder in `Idle`.
    pub fn bind(&mut self, locator: Option<ImageLocator>) -> Option<ArtworkRequest> {
        self.surface.show_placeholder();
        self.current = self.current.next();
        self.locator = locator.clone();

        match locator {
            Some(locator) => {
                self.state = BindingState::Pending(self.current);
                Some(ArtworkRequest {
                    token: self.current,
                    locator,
                })
            }
            None => {
                self.state = BindingState::Idle;
                None
            }
        }
    }

    /// Detach the cell from any item, invalidating loads in flight.
    pub fn unbind(&mut self) {
        self.surface.show_placeholder();
        self.current = self.current.next();
        self.locator = None;
        self.state = BindingState::Idle;
    }

    /// Deliver a finished load.
    pub fn resolve(&mut self, loaded: ArtworkLoaded) -> BindOutcome {
        if self.state != BindingState::Pending(loaded.token) {
            trace!(
                "stale artwork discarded: token={}, current={}",
                loaded.token.generation,
                self.current.generation
            );
            return BindOutcome::Discarded;
        }

        match loaded.outcome {
            Ok(result) => {
                let presentation = Presentation::from(result.provenance);
                self.surface.show_artwork(&result.artifact, presentation);
                self.state = BindingState::Applied(loaded.token);
                BindOutcome::Applied(presentation)
            }
            Err(error) => {
                self.surface.show_unavailable(&error);
                self.state = BindingState::Failed(loaded.token);
                BindOutcome::Failed(error)
            }
        }
    }
}
