//! Raw image frames.
//!
//! A `Frame` is an 8-bit RGB image stored row-major as height x width x 3.
//! Frames come from a `CameraSource` or are supplied directly by the caller.
//! The detector never retains them past a single prediction.

use anyhow::{anyhow, Result};

/// Channels per pixel.
pub const RGB_CHANNELS: usize = 3;

/// 8-bit RGB frame (HWC layout).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap an RGB buffer. Fails if either dimension is zero or the length is off.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero, got {}x{}", width, height));
        }
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Frame with every pixel set to `rgb`.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let pixels = rgb_len(width, height)? / RGB_CHANNELS;
        let data = rgb.iter().copied().cycle().take(pixels * RGB_CHANNELS).collect();
        Self::from_rgb(data, width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// RGB triple at (x, y), or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Convert a decoded image into a frame.
    #[cfg(feature = "frame-image")]
    pub fn from_image(image: &image::DynamicImage) -> Result<Self> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_rgb(rgb.into_raw(), width, height)
    }

    /// Decode an image file (JPEG or PNG) into a frame.
    #[cfg(feature = "frame-image")]
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let image =
            image::open(path).with_context(|| format!("failed to decode image {}", path.display()))?;
        Self::from_image(&image)
    }
}

pub(crate) fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(RGB_CHANNELS))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}
