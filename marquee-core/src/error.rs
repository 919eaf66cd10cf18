use marquee_model::{ModelError, TrackedItemId};
use thiserror::Error;

/// Why an artwork request could not produce an image.
///
/// This is cloneable so a single failed retrieval can be handed to every
/// caller that was coalesced onto it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageUnavailable {
    #[error("network error: {0}")]
    Network(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("fetch aborted: {0}")]
    Aborted(String),
}

/// A save or delete against the tracked item store failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceFailure {
    #[error("failed to load tracked items: {0}")]
    Load(String),

    #[error("failed to save tracked items: {0}")]
    Save(String),

    #[error("failed to delete tracked item {id}: {reason}")]
    Delete { id: TrackedItemId, reason: String },
}

/// Structural problems with a list snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("duplicate section identifier: {0}")]
    DuplicateSection(String),

    #[error("duplicate item identifier {item} in section {section}")]
    DuplicateItem { section: String, item: String },

    #[error("unknown section: {0}")]
    UnknownSection(String),
}

/// A list view could not apply a changeset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("list view rejected update: {0}")]
pub struct ViewRejected(pub String);

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    ImageUnavailable(#[from] ImageUnavailable),

    #[error(transparent)]
    Persistence(#[from] PersistenceFailure),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    View(#[from] ViewRejected),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("tracked item not found: {0}")]
    NotFound(TrackedItemId),

    #[error("disk cache error: {0}")]
    DiskCache(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
