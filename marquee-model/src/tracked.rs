use crate::{
    error::{ModelError, Result},
    ids::TrackedItemId,
    image::ImageLocator,
};

/// Which list a tracked entry currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrackingState {
    #[default]
    Watching,
    Finished,
}

/// A show or movie the user is following.
///
/// `progress` is a normalised metric in `0.0..=1.0` (watched episodes over
/// total, or playback position over runtime for movies).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackedItem {
    pub id: TrackedItemId,
    pub display_name: String,
    pub last_seen_label: String,
    pub image_locator: Option<ImageLocator>,
    pub progress: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub state: TrackingState,
}

impl TrackedItem {
    pub fn new(
        id: TrackedItemId,
        display_name: impl Into<String>,
        progress: f64,
    ) -> Result<Self> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(ModelError::InvalidTrackedItem(format!(
                "{id}: display name must not be empty"
            )));
        }
        Ok(Self {
            id,
            display_name,
            last_seen_label: String::new(),
            image_locator: None,
            progress: validate_progress(progress)?,
            state: TrackingState::Watching,
        })
    }

    pub fn with_last_seen(mut self, label: impl Into<String>) -> Self {
        self.last_seen_label = label.into();
        self
    }

    pub fn with_image(mut self, locator: ImageLocator) -> Self {
        self.image_locator = Some(locator);
        self
    }

    pub fn set_progress(&mut self, progress: f64) -> Result<()> {
        self.progress = validate_progress(progress)?;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.state == TrackingState::Finished
    }
}

fn validate_progress(progress: f64) -> Result<f64> {
    if progress.is_finite() && (0.0..=1.0).contains(&progress) {
        Ok(progress)
    } else {
        Err(ModelError::InvalidProgress(format!(
            "{progress} is outside 0.0..=1.0"
        )))
    }
}
