//! Camera frame source.
//!
//! `CameraSource` owns at most one open capture handle. Devices are addressed
//! by index and resolved against a path prefix (`/dev/video` by default).
//! A prefix starting with `stub://` selects a deterministic synthetic camera.
//!
//! Capture is requested at 640x480 with a single driver buffer so `read`
//! always returns the newest frame instead of a queued one. Reads block for
//! as long as the driver does; no timeout is applied.

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;
pub const CAPTURE_BUFFERS: u32 = 1;
pub const DEFAULT_DEVICE_PREFIX: &str = "/dev/video";

const SYNTHETIC_SCHEME: &str = "stub://";

/// Single-handle camera source.
pub struct CameraSource {
    device_prefix: String,
    active: Option<ActiveCamera>,
    frames_captured: u64,
}

struct ActiveCamera {
    path: String,
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-v4l2")]
    Device(device::DeviceCamera),
}

impl CameraSource {
    pub fn new(device_prefix: impl Into<String>) -> Self {
        Self {
            device_prefix: device_prefix.into(),
            active: None,
            frames_captured: 0,
        }
    }

    /// Path that `open(index)` will use.
    pub fn device_path(&self, index: u32) -> String {
        format!("{}{}", self.device_prefix, index)
    }

    /// Open the device at `index`.
    ///
    /// An already-open handle is released first; two handles are never held.
    pub fn open(&mut self, index: u32) -> Result<()> {
        if let Some(previous) = &self.active {
            log::info!("camera {} already open, releasing it before reopening", previous.path);
            self.close();
        }

        let path = self.device_path(index);
        let backend = if path.starts_with(SYNTHETIC_SCHEME) {
            CameraBackend::Synthetic(SyntheticCamera::new())
        } else {
            open_device(&path)?
        };

        log::info!(
            "camera {} opened ({}x{}, {} buffer)",
            path,
            CAPTURE_WIDTH,
            CAPTURE_HEIGHT,
            CAPTURE_BUFFERS
        );
        self.active = Some(ActiveCamera { path, backend });
        Ok(())
    }

    /// Capture the next frame. Fails when closed or when the driver yields nothing.
    pub fn read(&mut self) -> Result<Frame> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| anyhow!("camera is not open"))?;
        let frame = match &mut active.backend {
            CameraBackend::Synthetic(camera) => camera.next_frame(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.next_frame(),
        }?;
        self.frames_captured += 1;
        Ok(frame)
    }

    /// Release the handle. Safe to call when already closed.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            log::info!("camera {} released", active.path);
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Path of the open device, if any.
    pub fn active_device(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.path.as_str())
    }

    /// Frames read since this source was created.
    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }
}

impl Default for CameraSource {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_PREFIX)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(feature = "camera-v4l2")]
fn open_device(path: &str) -> Result<CameraBackend> {
    Ok(CameraBackend::Device(device::DeviceCamera::open(path)?))
}

#[cfg(not(feature = "camera-v4l2"))]
fn open_device(path: &str) -> Result<CameraBackend> {
    Err(anyhow!(
        "opening camera {} requires the camera-v4l2 feature",
        path
    ))
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://)
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    frame_count: u64,
}

impl SyntheticCamera {
    fn new() -> Self {
        Self { frame_count: 0 }
    }

    /// Moving diagonal pattern; frame N is identical across runs.
    fn next_frame(&mut self) -> Result<Frame> {
        let width = CAPTURE_WIDTH as usize;
        let height = CAPTURE_HEIGHT as usize;
        let shift = self.frame_count as usize;
        let mut pixels = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x + shift) % 256) as u8);
                pixels.push(((y + shift) % 256) as u8);
                pixels.push(((x + y) % 256) as u8);
            }
        }
        self.frame_count += 1;
        Frame::from_rgb(pixels, CAPTURE_WIDTH, CAPTURE_HEIGHT)
    }
}

// ----------------------------------------------------------------------------
// V4L2 device
// ----------------------------------------------------------------------------

#[cfg(feature = "camera-v4l2")]
mod device {
    use anyhow::{anyhow, Context, Result};
    use ouroboros::self_referencing;

    use super::{CAPTURE_BUFFERS, CAPTURE_HEIGHT, CAPTURE_WIDTH};
    use crate::frame::Frame;
    use crate::ingest::normalize::{normalize_to_rgb, PixelFormat};

    pub(super) struct DeviceCamera {
        state: DeviceState,
        format: PixelFormat,
        width: u32,
        height: u32,
    }

    #[self_referencing]
    struct DeviceState {
        device: v4l::Device,
        #[borrows(device)]
        #[covariant]
        stream: v4l::prelude::MmapStream<'this>,
    }

    impl DeviceCamera {
        pub(super) fn open(path: &str) -> Result<Self> {
            use v4l::buffer::Type;
            use v4l::video::Capture;

            let device =
                v4l::Device::with_path(path).with_context(|| format!("open v4l2 device {}", path))?;
            let mut format = device.format().context("read v4l2 format")?;
            format.width = CAPTURE_WIDTH;
            format.height = CAPTURE_HEIGHT;
            format.fourcc = v4l::FourCC::new(b"RGB3");

            let format = match device.set_format(&format) {
                Ok(format) => format,
                Err(err) => {
                    log::warn!("camera {}: failed to set 640x480 RGB3: {}", path, err);
                    device
                        .format()
                        .context("read v4l2 format after set failure")?
                }
            };

            let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
                anyhow!("camera {} delivers unsupported pixel format {}", path, format.fourcc)
            })?;

            let state = DeviceStateTryBuilder {
                device,
                stream_builder: |device| {
                    v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, CAPTURE_BUFFERS)
                        .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
                },
            }
            .try_build()?;

            Ok(Self {
                state,
                format: pixel_format,
                width: format.width,
                height: format.height,
            })
        }

        pub(super) fn next_frame(&mut self) -> Result<Frame> {
            use v4l::io::traits::CaptureStream;

            let raw = self
                .state
                .with_stream_mut(|stream| {
                    stream.next().map(|(buf, meta)| {
                        let used = meta.bytesused as usize;
                        if used > 0 && used <= buf.len() {
                            buf[..used].to_vec()
                        } else {
                            buf.to_vec()
                        }
                    })
                })
                .context("capture v4l2 frame")?;

            let rgb = normalize_to_rgb(&raw, self.width, self.height, self.format)?;
            Frame::from_rgb(rgb, self.width, self.height)
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
