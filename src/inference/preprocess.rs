//! Frame preprocessing.
//!
//! The classifier was trained on 224x224 RGB input normalized with
//! `v / 127.0 - 1.0`. These constants are part of the model contract and
//! must not be changed: 127.0 (not 127.5) maps 255 to ~1.0079.

use anyhow::Result;

use crate::frame::Frame;

use super::resize::resize_area;

pub const INPUT_WIDTH: usize = 224;
pub const INPUT_HEIGHT: usize = 224;
pub const INPUT_CHANNELS: usize = 3;
pub const NORMALIZE_DIVISOR: f32 = 127.0;

/// Model input, NHWC with shape (1, 224, 224, 3).
#[derive(Clone, Debug, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
}

impl InputTensor {
    pub const SHAPE: [usize; 4] = [1, INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS];

    pub fn shape(&self) -> [usize; 4] {
        Self::SHAPE
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Resize to 224x224 with area interpolation, then normalize to roughly [-1, 1].
pub fn preprocess(frame: &Frame) -> Result<InputTensor> {
    let resized = resize_area(frame, INPUT_WIDTH as u32, INPUT_HEIGHT as u32)?;
    let data = resized
        .iter()
        .map(|&v| v as f32 / NORMALIZE_DIVISOR - 1.0)
        .collect();
    Ok(InputTensor { data })
}
