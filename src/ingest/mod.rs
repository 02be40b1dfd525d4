//! Frame capture.
//!
//! `CameraSource` is the only capture path: V4L2 devices when built with the
//! `camera-v4l2` feature, plus a synthetic `stub://` camera for tests and dry
//! runs. Callers may also hand frames to the detector directly.
//!
//! Captured frames are returned to the caller and never buffered here.

pub mod camera;
mod normalize;

pub use camera::{
    CameraSource, CAPTURE_BUFFERS, CAPTURE_HEIGHT, CAPTURE_WIDTH, DEFAULT_DEVICE_PREFIX,
};
