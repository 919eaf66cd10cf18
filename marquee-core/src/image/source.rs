use std::fmt;

use async_trait::async_trait;
use marquee_model::ImageLocator;
use tracing::{debug, warn};

use crate::error::ImageUnavailable;

/// The one remote capability the fetcher needs: bytes for a locator.
///
/// Implementations make a single attempt. Retry and backoff, if any, belong
/// to the transport behind this trait.
#[async_trait]
pub trait RemoteImageSource: Send + Sync + fmt::Debug {
    async fn retrieve(
        &self,
        locator: &ImageLocator,
    ) -> Result<Vec<u8>, ImageUnavailable>;
}

/// `reqwest`-backed source issuing one GET per retrieval.
#[derive(Debug, Clone, Default)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteImageSource for HttpImageSource {
    async fn retrieve(
        &self,
        locator: &ImageLocator,
    ) -> Result<Vec<u8>, ImageUnavailable> {
        debug!("Fetching image from URL: {}", locator);

        let response = self
            .client
            .get(locator.as_url().clone())
            .send()
            .await
            .map_err(|e| ImageUnavailable::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Failed to fetch image: {} - {}", locator, status);
            return Err(ImageUnavailable::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageUnavailable::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
