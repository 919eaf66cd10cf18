use std::fmt;

use marquee_model::{
    ImageLocator, ImageSize, MediaEntity, ModelError, ModelResult,
    PosterSize, StillSize,
};
use url::Url;

/// Default artwork CDN root.
pub const DEFAULT_ARTWORK_BASE_URL: &str = "https://image.tmdb.org/t/p/";

const CACHE_KEY_PREFIX: &str = "images/v1/";

/// Stable key for locating a decoded image in the memory and disk caches.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a locator.
    ///
    /// Keys are versioned and derived from the normalised locator text, so
    /// equal locators always map to the same key.
    pub fn for_locator(locator: &ImageLocator) -> Self {
        let raw = locator.as_str();
        let mut key = String::with_capacity(CACHE_KEY_PREFIX.len() + raw.len());
        key.push_str(CACHE_KEY_PREFIX);
        key.push_str(raw);
        CacheKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.0).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locator and cache identity for one entity's artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtwork {
    pub key: CacheKey,
    pub locator: ImageLocator,
    pub size: ImageSize,
}

/// Maps catalogue entities onto artwork locators.
#[derive(Debug, Clone)]
pub struct MediaKeyResolver {
    base_url: Url,
    poster_size: PosterSize,
    still_size: StillSize,
}

impl Default for MediaKeyResolver {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poster_size: PosterSize::default(),
            still_size: StillSize::default(),
        }
    }
}

fn default_base_url() -> Url {
    match Url::parse(DEFAULT_ARTWORK_BASE_URL) {
        Ok(url) => url,
        Err(_) => unreachable!("default artwork base url is a valid literal"),
    }
}

impl MediaKeyResolver {
    pub fn new(
        base_url: Url,
        poster_size: PosterSize,
        still_size: StillSize,
    ) -> ModelResult<Self> {
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ModelError::InvalidLocator(format!(
                "artwork base url must be http(s): {base_url}"
            )));
        }
        Ok(Self {
            base_url,
            poster_size,
            still_size,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Size used for an entity's artwork.
    pub fn size_for(&self, entity: &MediaEntity) -> ImageSize {
        match entity {
            MediaEntity::Episode { .. } => ImageSize::Still(self.still_size),
            _ => ImageSize::Poster(self.poster_size),
        }
    }

    /// Resolve the artwork for `entity`.
    ///
    /// Returns `Ok(None)` when the catalogue has no artwork for it. A path that
    /// is already an absolute http(s) URL is used as-is.
    pub fn resolve(
        &self,
        entity: &MediaEntity,
    ) -> ModelResult<Option<ResolvedArtwork>> {
        let Some(path) = entity.artwork_path() else {
            return Ok(None);
        };
        let size = self.size_for(entity);
        let locator = self.locator_for_path(path, size)?;
        Ok(Some(ResolvedArtwork {
            key: CacheKey::for_locator(&locator),
            locator,
            size,
        }))
    }

    pub fn locator_for_path(
        &self,
        path: &str,
        size: ImageSize,
    ) -> ModelResult<ImageLocator> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return ImageLocator::parse(path);
        }
        if path.contains("..") || path.contains('?') || path.contains('#') {
            return Err(ModelError::InvalidImagePath(path.to_string()));
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        ImageLocator::parse(&format!("{base}/{}/{path}", size.width_name()))
    }

    /// Cache key for an arbitrary locator.
    pub fn key_for(&self, locator: &ImageLocator) -> CacheKey {
        CacheKey::for_locator(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_model::{EpisodeKey, TmdbId};

    fn series(path: Option<&str>) -> MediaEntity {
        MediaEntity::Series {
            tmdb_id: TmdbId(1399),
            name: "Game of Thrones".into(),
            poster_path: path.map(str::to_string),
        }
    }

    #[test]
    fn poster_paths_resolve_against_cdn_root() {
        let resolver = MediaKeyResolver::default();
        let resolved = resolver
            .resolve(&series(Some("/u3bZgnGQ9T01sWNhyveQz0wH0Hl.jpg")))
            .unwrap()
            .unwrap();

        assert_eq!(
            resolved.locator.as_str(),
            "https://image.tmdb.org/t/p/w185/u3bZgnGQ9T01sWNhyveQz0wH0Hl.jpg"
        );
        assert_eq!(
            resolved.key.as_str(),
            "images/v1/https://image.tmdb.org/t/p/w185/u3bZgnGQ9T01sWNhyveQz0wH0Hl.jpg"
        );
        assert_eq!(resolved.size, ImageSize::Poster(PosterSize::W185));
    }

    #[test]
    fn episodes_use_still_size() {
        let resolver = MediaKeyResolver::default();
        let episode = MediaEntity::Episode {
            key: EpisodeKey {
                series: TmdbId(1399),
                season_number: 1,
                episode_number: 1,
            },
            still_path: Some("/still.jpg".into()),
        };
        let resolved = resolver.resolve(&episode).unwrap().unwrap();
        assert!(resolved.locator.as_str().ends_with("/w300/still.jpg"));
    }

    #[test]
    fn missing_artwork_resolves_to_none() {
        let resolver = MediaKeyResolver::default();
        assert_eq!(resolver.resolve(&series(None)).unwrap(), None);
    }

    #[test]
    fn equal_locators_share_a_key() {
        let resolver = MediaKeyResolver::default();
        let a = resolver.resolve(&series(Some("/a.jpg"))).unwrap().unwrap();
        let b = resolver.resolve(&series(Some("a.jpg"))).unwrap().unwrap();
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn traversal_paths_are_rejected() {
        let resolver = MediaKeyResolver::default();
        assert!(matches!(
            resolver.resolve(&series(Some("/../secret"))),
            Err(ModelError::InvalidImagePath(_))
        ));
    }

    #[test]
    fn absolute_urls_pass_through() {
        let resolver = MediaKeyResolver::default();
        let resolved = resolver
            .resolve(&series(Some("https://cdn.example.com/p.png")))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.locator.as_str(), "https://cdn.example.com/p.png");
    }

    #[test]
    fn non_http_base_is_rejected() {
        let base = Url::parse("ftp://example.com/").unwrap();
        assert!(
            MediaKeyResolver::new(base, PosterSize::W92, StillSize::W92)
                .is_err()
        );
    }
}
