//! Area-interpolated resize (OpenCV `INTER_AREA`).
//!
//! With the `preprocess-opencv` feature the resize is done by OpenCV itself,
//! which is the reference for what the classifier saw during training.
//! Without it a portable implementation follows the same three paths OpenCV
//! takes for 8-bit input:
//!
//! - exact integer shrink: block sums, `(sum + 2) >> 2` for 2x2 blocks and
//!   `round_ties_even(sum / area)` otherwise
//! - fractional shrink on both axes: coverage-weighted means
//! - growth on either axis: two-tap area-linear weights

use anyhow::Result;

use crate::frame::{Frame, RGB_CHANNELS};

/// Resize an RGB frame to `dst_width` x `dst_height`, returning 8-bit HWC pixels.
pub fn resize_area(frame: &Frame, dst_width: u32, dst_height: u32) -> Result<Vec<u8>> {
    #[cfg(feature = "preprocess-opencv")]
    {
        opencv_area(frame, dst_width, dst_height)
    }
    #[cfg(not(feature = "preprocess-opencv"))]
    {
        Ok(portable_area(frame, dst_width, dst_height))
    }
}

#[cfg(feature = "preprocess-opencv")]
fn opencv_area(frame: &Frame, dst_width: u32, dst_height: u32) -> Result<Vec<u8>> {
    use anyhow::Context;
    use opencv::core::{self, Mat, Scalar};
    use opencv::prelude::*;

    let mut src = Mat::new_rows_cols_with_default(
        i32::try_from(frame.height()).context("frame height exceeds OpenCV limits")?,
        i32::try_from(frame.width()).context("frame width exceeds OpenCV limits")?,
        core::CV_8UC3,
        Scalar::all(0.0),
    )
    .context("allocate OpenCV source matrix")?;
    src.data_bytes_mut()
        .context("borrow OpenCV source matrix")?
        .copy_from_slice(frame.as_bytes());

    let mut dst = Mat::default();
    opencv::imgproc::resize(
        &src,
        &mut dst,
        core::Size {
            width: i32::try_from(dst_width).context("target width exceeds OpenCV limits")?,
            height: i32::try_from(dst_height).context("target height exceeds OpenCV limits")?,
        },
        0.0,
        0.0,
        opencv::imgproc::INTER_AREA,
    )
    .context("OpenCV INTER_AREA resize failed")?;

    Ok(dst
        .data_bytes()
        .context("read OpenCV resized matrix")?
        .to_vec())
}

#[cfg_attr(feature = "preprocess-opencv", allow(dead_code))]
fn portable_area(frame: &Frame, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    let dst_w = dst_width as usize;
    let dst_h = dst_height as usize;

    if src_w >= dst_w && src_h >= dst_h && src_w % dst_w == 0 && src_h % dst_h == 0 {
        return integer_shrink(frame, src_w / dst_w, src_h / dst_h, dst_w, dst_h);
    }

    let scale_x = src_w as f64 / dst_w as f64;
    let scale_y = src_h as f64 / dst_h as f64;
    let (x_taps, y_taps) = if scale_x >= 1.0 && scale_y >= 1.0 {
        (area_taps(src_w, dst_w, scale_x), area_taps(src_h, dst_h, scale_y))
    } else {
        (linear_taps(src_w, dst_w, scale_x), linear_taps(src_h, dst_h, scale_y))
    };
    separable(frame, &x_taps, &y_taps)
}

/// Whole-block averaging with OpenCV's 8-bit rounding.
fn integer_shrink(frame: &Frame, sx: usize, sy: usize, dst_w: usize, dst_h: usize) -> Vec<u8> {
    let pixels = frame.as_bytes();
    let stride = frame.width() as usize * RGB_CHANNELS;
    let area = sx * sy;
    let inv_area = 1.0 / area as f32;

    let mut out = Vec::with_capacity(dst_w * dst_h * RGB_CHANNELS);
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            for c in 0..RGB_CHANNELS {
                let mut sum = 0u32;
                for y in dy * sy..(dy + 1) * sy {
                    let row = &pixels[y * stride..(y + 1) * stride];
                    for x in dx * sx..(dx + 1) * sx {
                        sum += row[x * RGB_CHANNELS + c] as u32;
                    }
                }
                let value = if sx == 2 && sy == 2 {
                    ((sum + 2) >> 2) as u8
                } else {
                    saturate_u8(sum as f32 * inv_area)
                };
                out.push(value);
            }
        }
    }
    out
}

type Taps = Vec<Vec<(usize, f32)>>;

fn separable(frame: &Frame, x_taps: &Taps, y_taps: &Taps) -> Vec<u8> {
    let src_w = frame.width() as usize;
    let src_h = frame.height() as usize;
    let dst_w = x_taps.len();
    let pixels = frame.as_bytes();

    // Horizontal pass into a float buffer, vertical pass rounds once at the end.
    let mut rows = vec![0f32; src_h * dst_w * RGB_CHANNELS];
    for y in 0..src_h {
        let src_row = &pixels[y * src_w * RGB_CHANNELS..(y + 1) * src_w * RGB_CHANNELS];
        let dst_row = &mut rows[y * dst_w * RGB_CHANNELS..(y + 1) * dst_w * RGB_CHANNELS];
        for (dx, taps) in x_taps.iter().enumerate() {
            for c in 0..RGB_CHANNELS {
                dst_row[dx * RGB_CHANNELS + c] = taps
                    .iter()
                    .map(|&(sx, w)| src_row[sx * RGB_CHANNELS + c] as f32 * w)
                    .sum();
            }
        }
    }

    let row_len = dst_w * RGB_CHANNELS;
    let mut out = vec![0u8; y_taps.len() * row_len];
    for (dy, taps) in y_taps.iter().enumerate() {
        for i in 0..row_len {
            let value: f32 = taps.iter().map(|&(sy, w)| rows[sy * row_len + i] * w).sum();
            out[dy * row_len + i] = saturate_u8(value);
        }
    }
    out
}

/// Source taps for shrinking: each destination cell covers `scale` source cells,
/// partially at both edges.
fn area_taps(src: usize, dst: usize, scale: f64) -> Taps {
    (0..dst)
        .map(|d| {
            let fs1 = d as f64 * scale;
            let fs2 = fs1 + scale;
            let cell = scale.min(src as f64 - fs1);

            let s2 = (fs2.floor() as usize).min(src - 1);
            let s1 = (fs1.ceil() as usize).min(s2);

            let mut taps = Vec::with_capacity(scale.ceil() as usize + 1);
            if s1 as f64 - fs1 > 1e-3 {
                taps.push((s1 - 1, ((s1 as f64 - fs1) / cell) as f32));
            }
            for s in s1..s2 {
                taps.push((s, (1.0 / cell) as f32));
            }
            if fs2 - s2 as f64 > 1e-3 {
                let w = (fs2 - s2 as f64).min(1.0).min(cell) / cell;
                taps.push((s2, w as f32));
            }
            taps
        })
        .collect()
}

/// Two-tap weights used when enlarging on either axis.
fn linear_taps(src: usize, dst: usize, scale: f64) -> Taps {
    let inv_scale = dst as f64 / src as f64;
    (0..dst)
        .map(|d| {
            let mut s = (d as f64 * scale).floor() as isize;
            let mut f = (d + 1) as f64 - (s + 1) as f64 * inv_scale;
            f = if f <= 0.0 { 0.0 } else { f - f.floor() };

            if s < 0 {
                s = 0;
                f = 0.0;
            }
            let s = s as usize;
            if s + 1 >= src {
                return vec![(src - 1, 1.0)];
            }
            vec![(s, (1.0 - f) as f32), (s + 1, f as f32)]
        })
        .collect()
}

fn saturate_u8(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Result<Frame> {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x * 7 + y * 3) % 256) as u8]);
            }
        }
        Frame::from_rgb(data, width, height)
    }

    /// Frame tiled with a 2x2 gray block: top row `a, b`, bottom row `c, d`.
    fn tiled(width: u32, height: u32, block: [u8; 4]) -> Result<Frame> {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = block[(y as usize % 2) * 2 + x as usize % 2];
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::from_rgb(data, width, height)
    }

    #[test]
    fn half_size_rounds_ties_up() -> Result<()> {
        let frame = tiled(448, 448, [1, 1, 0, 0])?;
        let out = portable_area(&frame, 224, 224);
        assert_eq!(out.len(), 224 * 224 * 3);
        assert!(out.iter().all(|&v| v == 1));

        // Mean 2.5 would round to 2 under ties-to-even.
        let frame = tiled(4, 2, [2, 3, 2, 3])?;
        assert_eq!(portable_area(&frame, 2, 1), vec![3; 6]);
        Ok(())
    }

    #[test]
    fn other_integer_scales_round_ties_to_even() -> Result<()> {
        // 4x1 blocks [1, 1, 0, 0] average to 0.5.
        let data: Vec<u8> = [1u8, 1, 0, 0].iter().flat_map(|&v| [v, v, v]).collect();
        let frame = Frame::from_rgb(data, 4, 1)?;
        assert_eq!(portable_area(&frame, 1, 1), vec![0, 0, 0]);

        // 3x3 block summing to 13 averages to 1.44.
        let mut data = vec![0u8; 27];
        for (i, v) in [1u8, 1, 1, 1, 1, 1, 1, 1, 5].iter().enumerate() {
            data[i * 3..i * 3 + 3].copy_from_slice(&[*v, *v, *v]);
        }
        let frame = Frame::from_rgb(data, 3, 3)?;
        assert_eq!(portable_area(&frame, 1, 1), vec![1, 1, 1]);
        Ok(())
    }

    #[test]
    fn integer_downscale_averages_blocks() -> Result<()> {
        let data = vec![
            0, 0, 0, 10, 10, 10, 100, 100, 100, 200, 200, 200, //
            20, 20, 20, 30, 30, 30, 50, 50, 50, 50, 50, 50,
        ];
        let frame = Frame::from_rgb(data, 4, 2)?;
        assert_eq!(portable_area(&frame, 2, 1), vec![15, 15, 15, 100, 100, 100]);
        Ok(())
    }

    #[test]
    fn fractional_downscale_weights_partial_cells() -> Result<()> {
        // 3 -> 2: cells cover [0, 1.5) and [1.5, 3).
        let data = vec![0, 0, 0, 90, 90, 90, 180, 180, 180];
        let frame = Frame::from_rgb(data, 3, 1)?;
        assert_eq!(portable_area(&frame, 2, 1), vec![30, 30, 30, 150, 150, 150]);
        Ok(())
    }

    #[test]
    fn uniform_frame_survives_resize() -> Result<()> {
        for (w, h) in [(640, 480), (1280, 720), (100, 300), (31, 17), (448, 448)] {
            let frame = Frame::filled(w, h, [12, 34, 56])?;
            let out = resize_area(&frame, 224, 224)?;
            assert!(out.chunks(3).all(|px| px == [12, 34, 56]), "{w}x{h}");
        }
        Ok(())
    }

    #[test]
    fn identity_size_is_lossless() -> Result<()> {
        let frame = gradient(224, 224)?;
        assert_eq!(resize_area(&frame, 224, 224)?, frame.as_bytes());
        Ok(())
    }

    #[cfg(feature = "preprocess-opencv")]
    #[test]
    fn portable_path_tracks_opencv() -> Result<()> {
        for (w, h) in [(448, 448), (672, 224), (896, 672)] {
            let frame = gradient(w, h)?;
            assert_eq!(portable_area(&frame, 224, 224), opencv_area(&frame, 224, 224)?, "{w}x{h}");
        }
        for (w, h) in [(640, 480), (1280, 720), (300, 200), (100, 50)] {
            let frame = gradient(w, h)?;
            let ours = portable_area(&frame, 224, 224);
            let reference = opencv_area(&frame, 224, 224)?;
            let worst = ours
                .iter()
                .zip(&reference)
                .map(|(a, b)| (*a as i16 - *b as i16).abs())
                .max()
                .unwrap_or(0);
            assert!(worst <= 1, "{w}x{h}: off by {worst}");
        }
        Ok(())
    }
}
