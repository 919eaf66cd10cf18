mod common;

use std::sync::Arc;

use common::{ScriptedSource, locator, png_bytes};
use marquee_core::{
    binding::{ArtworkCell, ArtworkSurface, BindOutcome, BindingState, Presentation},
    image::{DecodedImage, ImageCache, ImageFetcher},
};

#[derive(Debug, Default)]
struct Poster {
    /// Width of each artifact applied, in order.
    applied: Vec<(u32, Presentation)>,
    placeholders: usize,
}

impl ArtworkSurface for Poster {
    fn show_placeholder(&mut self) {
        self.placeholders += 1;
    }

    fn show_artwork(&mut self, artifact: &DecodedImage, presentation: Presentation) {
        self.applied.push((artifact.width(), presentation));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rebinding_before_the_first_load_resolves_shows_only_the_second() {
    let source = ScriptedSource::new();
    let x = locator("x");
    let y = locator("y");
    source.respond(&x, Ok(png_bytes(10, 1)));
    source.respond(&y, Ok(png_bytes(20, 1)));
    source.gate(&x);

    let fetcher = ImageFetcher::builder(Arc::new(ImageCache::default()), source.clone()).build();
    let mut cell = ArtworkCell::new(Poster::default());

    let load_x = {
        let request = cell.bind(Some(x.clone())).unwrap();
        let fetcher = fetcher.clone();
        tokio::spawn(async move { request.load(&fetcher).await })
    };
    let load_y = {
        let request = cell.bind(Some(y.clone())).unwrap();
        let fetcher = fetcher.clone();
        tokio::spawn(async move { request.load(&fetcher).await })
    };

    let y_loaded = load_y.await.unwrap();
    assert_eq!(
        cell.resolve(y_loaded),
        BindOutcome::Applied(Presentation::CrossFade)
    );

    source.open(&x);
    let x_loaded = load_x.await.unwrap();
    assert!(x_loaded.outcome.is_ok());
    assert_eq!(cell.resolve(x_loaded), BindOutcome::Discarded);

    assert_eq!(cell.surface().applied, vec![(20, Presentation::CrossFade)]);
    assert_eq!(cell.surface().placeholders, 2);
    assert!(matches!(cell.state(), BindingState::Applied(token) if token.generation() == 2));
}

#[tokio::test]
async fn cached_artwork_is_applied_without_transition() {
    let source = ScriptedSource::new();
    let poster = locator("warm");
    source.respond(&poster, Ok(png_bytes(5, 5)));
    let fetcher = ImageFetcher::builder(Arc::new(ImageCache::default()), source.clone()).build();
    fetcher.fetch(&poster).await.unwrap();

    let mut cell = ArtworkCell::new(Poster::default());
    let request = cell.bind(Some(poster)).unwrap();
    let loaded = request.load(&fetcher).await;

    assert_eq!(cell.resolve(loaded), BindOutcome::Applied(Presentation::Immediate));
    assert_eq!(source.total_calls(), 1);
}

#[tokio::test]
async fn failed_load_keeps_the_placeholder() {
    let source = ScriptedSource::new();
    let fetcher = ImageFetcher::builder(Arc::new(ImageCache::default()), source.clone()).build();
    let mut cell = ArtworkCell::new(Poster::default());

    let request = cell.bind(Some(locator("gone"))).unwrap();
    let outcome = cell.resolve(request.load(&fetcher).await);

    assert!(matches!(outcome, BindOutcome::Failed(_)));
    assert!(cell.surface().applied.is_empty());
    assert_eq!(cell.surface().placeholders, 1);
}
