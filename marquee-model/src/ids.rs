use uuid::Uuid;

/// Strongly typed ID for a tracked show or movie entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackedItemId(pub Uuid);

impl Default for TrackedItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedItemId {
    pub fn new() -> Self {
        TrackedItemId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for TrackedItemId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for TrackedItemId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TrackedItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote catalogue identifier (TMDB numeric id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TmdbId(pub u64);

impl TmdbId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TmdbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Season identity independent of files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeasonKey {
    pub series: TmdbId,
    pub season_number: u16,
}

/// Episode identity independent of files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeKey {
    pub series: TmdbId,
    pub season_number: u16,
    pub episode_number: u16,
}

impl EpisodeKey {
    pub const fn season(&self) -> SeasonKey {
        SeasonKey {
            series: self.series,
            season_number: self.season_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_key_projects_to_its_season() {
        let key = EpisodeKey {
            series: TmdbId(1399),
            season_number: 3,
            episode_number: 9,
        };
        assert_eq!(
            key.season(),
            SeasonKey {
                series: TmdbId(1399),
                season_number: 3
            }
        );
    }

    #[test]
    fn tracked_ids_are_unique() {
        assert_ne!(TrackedItemId::new(), TrackedItemId::new());
    }
}
