use std::fmt::{Display, Formatter};

/// Image size variants
#[derive(Debug, Clone, Copy, PartialEq, Hash, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ImageSize {
    Poster(PosterSize), // Movie/series/season artwork
    Still(StillSize),   // Episode still (16:9)
}

impl Display for ImageSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSize::Poster(s) => write!(f, "Poster ({})", s.as_str()),
            ImageSize::Still(s) => write!(f, "Still ({})", s.as_str()),
        }
    }
}

impl ImageSize {
    /// Default poster size used by list cells (185px)
    pub const fn poster() -> Self {
        Self::Poster(PosterSize::W185)
    }

    /// Default episode still size (300px)
    pub const fn still() -> Self {
        Self::Still(StillSize::W300)
    }

    /// Path segment understood by the artwork CDN (e.g. "w185", "original")
    pub const fn width_name(&self) -> &'static str {
        match self {
            ImageSize::Poster(s) => s.as_str(),
            ImageSize::Still(s) => s.as_str(),
        }
    }

    /// Variant name used inside cache keys
    pub const fn variant(&self) -> &'static str {
        match self {
            ImageSize::Poster(_) => "poster",
            ImageSize::Still(_) => "still",
        }
    }

    pub const fn width(&self) -> Option<u16> {
        match self {
            ImageSize::Poster(s) => s.width(),
            ImageSize::Still(s) => s.width(),
        }
    }
}

/// Poster sizes (2:3 aspect ratio)
#[derive(Debug, Clone, Copy, PartialEq, Hash, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PosterSize {
    W92,
    W154,
    #[default]
    W185,
    W342,
    W500,
    W780,
    Original,
}

impl PosterSize {
    pub const ALL: [PosterSize; 7] = [
        Self::W92,
        Self::W154,
        Self::W185,
        Self::W342,
        Self::W500,
        Self::W780,
        Self::Original,
    ];

    pub const fn width(&self) -> Option<u16> {
        match self {
            Self::W92 => Some(92),
            Self::W154 => Some(154),
            Self::W185 => Some(185),
            Self::W342 => Some(342),
            Self::W500 => Some(500),
            Self::W780 => Some(780),
            Self::Original => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::W92 => "w92",
            Self::W154 => "w154",
            Self::W185 => "w185",
            Self::W342 => "w342",
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::Original => "original",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Episode still sizes (16:9 aspect ratio)
#[derive(Debug, Clone, Copy, PartialEq, Hash, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StillSize {
    W92,
    W185,
    #[default]
    W300,
    Original,
}

impl StillSize {
    pub const ALL: [StillSize; 4] =
        [Self::W92, Self::W185, Self::W300, Self::Original];

    pub const fn width(&self) -> Option<u16> {
        match self {
            Self::W92 => Some(92),
            Self::W185 => Some(185),
            Self::W300 => Some(300),
            Self::Original => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::W92 => "w92",
            Self::W185 => "w185",
            Self::W300 => "w300",
            Self::Original => "original",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}
