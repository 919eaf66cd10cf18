use thiserror::Error;

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    #[error("invalid image path: {0}")]
    InvalidImagePath(String),

    #[error("invalid progress value: {0}")]
    InvalidProgress(String),

    #[error("invalid tracked item: {0}")]
    InvalidTrackedItem(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
