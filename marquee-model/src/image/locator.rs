use std::fmt;

use url::Url;

use crate::error::{ModelError, Result};

/// Remote address of an artwork asset.
///
/// Construction goes through [`Url`] parsing, so two locators that differ only
/// in scheme/host casing or default port compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Url", into = "Url"))]
pub struct ImageLocator(Url);

impl ImageLocator {
    pub fn new(url: Url) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(ModelError::InvalidLocator(format!(
                "unsupported scheme `{other}` in {url}"
            ))),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| {
            ModelError::InvalidLocator(format!("{raw}: {e}"))
        })?;
        Self::new(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl TryFrom<Url> for ImageLocator {
    type Error = ModelError;

    fn try_from(value: Url) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ImageLocator> for Url {
    fn from(value: ImageLocator) -> Self {
        value.0
    }
}

impl fmt::Debug for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageLocator").field(&self.0.as_str()).finish()
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
