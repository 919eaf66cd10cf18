use std::{fmt, sync::Arc};

use crate::{error::ImageUnavailable, units::ByteSize};

/// A decoded RGBA8 image ready to hand to a renderer.
///
/// Pixel storage is shared, so clones are cheap and every cell showing the
/// same artwork points at the same buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl DecodedImage {
    pub fn from_rgba8(
        width: u32,
        height: u32,
        pixels: impl Into<Arc<[u8]>>,
    ) -> Result<Self, ImageUnavailable> {
        let pixels = pixels.into();
        let expected = u64::from(width) * u64::from(height) * 4;
        if pixels.len() as u64 != expected {
            return Err(ImageUnavailable::Decode(format!(
                "pixel buffer is {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Resident size used for cache budgeting.
    pub fn size_bytes(&self) -> ByteSize {
        ByteSize::from_usize(self.pixels.len())
    }

    /// True when both values share the same pixel allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Turns encoded bytes (JPEG, PNG, WebP...) into a [`DecodedImage`].
pub trait ImageDecoder: Send + Sync + fmt::Debug {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ImageUnavailable>;
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ImageUnavailable> {
        if bytes.is_empty() {
            return Err(ImageUnavailable::Decode("empty payload".into()));
        }
        let img = image::load_from_memory(bytes).map_err(|e| {
            ImageUnavailable::Decode(format!("failed to decode image: {e}"))
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        DecodedImage::from_rgba8(width, height, rgba.into_raw())
    }
}
