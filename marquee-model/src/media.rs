use std::fmt::{Display, Formatter};

use crate::ids::{EpisodeKey, SeasonKey, TmdbId};

/// Simple enum for media types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaType {
    /// Movie media type
    Movie,
    /// Series media type
    Series,
    /// Season media type
    Season,
    /// Episode media type
    Episode,
}

impl MediaType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Season => "season",
            MediaType::Episode => "episode",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "Movie"),
            MediaType::Series => write!(f, "Series"),
            MediaType::Season => write!(f, "Season"),
            MediaType::Episode => write!(f, "Episode"),
        }
    }
}

/// A remote catalogue entity that may carry artwork.
///
/// `*_path` fields hold the CDN-relative artwork path as returned by the
/// metadata API (e.g. `/kqjL17yufvn9OVLyXYpvtyrFfak.jpg`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum MediaEntity {
    Movie {
        tmdb_id: TmdbId,
        title: String,
        poster_path: Option<String>,
    },
    Series {
        tmdb_id: TmdbId,
        name: String,
        poster_path: Option<String>,
    },
    Season {
        key: SeasonKey,
        poster_path: Option<String>,
    },
    Episode {
        key: EpisodeKey,
        still_path: Option<String>,
    },
}

impl MediaEntity {
    pub const fn media_type(&self) -> MediaType {
        match self {
            MediaEntity::Movie { .. } => MediaType::Movie,
            MediaEntity::Series { .. } => MediaType::Series,
            MediaEntity::Season { .. } => MediaType::Season,
            MediaEntity::Episode { .. } => MediaType::Episode,
        }
    }

    /// Artwork path for this entity, if the catalogue provided one.
    pub fn artwork_path(&self) -> Option<&str> {
        let path = match self {
            MediaEntity::Movie { poster_path, .. }
            | MediaEntity::Series { poster_path, .. }
            | MediaEntity::Season { poster_path, .. } => poster_path.as_deref(),
            MediaEntity::Episode { still_path, .. } => still_path.as_deref(),
        };
        path.map(str::trim).filter(|p| !p.is_empty())
    }

    /// Human readable label, used for logging.
    pub fn label(&self) -> String {
        match self {
            MediaEntity::Movie { title, .. } => title.clone(),
            MediaEntity::Series { name, .. } => name.clone(),
            MediaEntity::Season { key, .. } => {
                format!("{} S{:02}", key.series, key.season_number)
            }
            MediaEntity::Episode { key, .. } => format!(
                "{} S{:02}E{:02}",
                key.series, key.season_number, key.episode_number
            ),
        }
    }
}
