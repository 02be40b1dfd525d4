#![cfg_attr(not(feature = "camera-v4l2"), allow(dead_code))]

use anyhow::{anyhow, Result};

use crate::frame::rgb_len;

/// Capture buffer layouts a device may hand back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PixelFormat {
    Rgb24,
    Bgr24,
    Yuyv,
}

impl PixelFormat {
    pub(crate) fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(Self::Rgb24),
            b"BGR3" => Some(Self::Bgr24),
            b"YUYV" => Some(Self::Yuyv),
            _ => None,
        }
    }
}

/// Convert a captured buffer into packed RGB24.
///
/// Buffers longer than the frame (driver padding) are truncated.
pub(crate) fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    match format {
        PixelFormat::Rgb24 => Ok(packed(pixels, width, height, "RGB")?.to_vec()),
        PixelFormat::Bgr24 => Ok(packed(pixels, width, height, "BGR")?
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect()),
        PixelFormat::Yuyv => yuyv_to_rgb(pixels, width, height),
    }
}

fn packed<'a>(pixels: &'a [u8], width: u32, height: u32, name: &str) -> Result<&'a [u8]> {
    let expected = rgb_len(width, height)?;
    if pixels.len() < expected {
        return Err(anyhow!(
            "{} frame length mismatch: expected {}, got {}",
            name,
            expected,
            pixels.len()
        ));
    }
    Ok(&pixels[..expected])
}

fn yuyv_to_rgb(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    if width % 2 != 0 {
        return Err(anyhow!("YUYV frame width must be even, got {}", width));
    }
    let pixel_count = rgb_len(width, height)? / 3;
    let expected = pixel_count * 2;
    if pixels.len() < expected {
        return Err(anyhow!(
            "YUYV frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    let mut rgb = Vec::with_capacity(pixel_count * 3);
    for macro_px in pixels[..expected].chunks_exact(4) {
        let u = macro_px[1] as f32 - 128.0;
        let v = macro_px[3] as f32 - 128.0;
        for y in [macro_px[0], macro_px[2]] {
            let y = y as f32;
            rgb.push(clamp_to_u8(y + 1.402_f32 * v));
            rgb.push(clamp_to_u8(y - 0.344_136_f32 * u - 0.714_136_f32 * v));
            rgb.push(clamp_to_u8(y + 1.772_f32 * u));
        }
    }
    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
