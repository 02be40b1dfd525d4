//! Frame classification: preprocess, forward pass, top-1 reduction.

mod engine;
mod preprocess;
mod resize;
mod result;

pub use engine::{infer, reduce, try_infer};
pub use preprocess::{
    preprocess, InputTensor, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH, NORMALIZE_DIVISOR,
};
pub use resize::resize_area;
pub use result::PredictionResult;
