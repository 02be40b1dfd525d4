//! Detector façade.
//!
//! Owns the loaded model, the label set and the camera. Construction never
//! fails: a model that cannot be loaded leaves the detector queryable but
//! every prediction comes back `None`.
//!
//! Camera lifecycle is Closed -> `open_camera` -> Open -> `close_camera` ->
//! Closed. The detector is single-threaded; wrap it in a `Mutex` to share it.

use std::path::Path;

use crate::config::DetectorConfig;
use crate::frame::Frame;
use crate::inference::{self, PredictionResult};
use crate::ingest::CameraSource;
use crate::labels::LabelSet;
use crate::model::{Model, ModelLoader};

pub use crate::config::DEFAULT_THRESHOLD;

pub struct Detector {
    model: Option<Model>,
    labels: LabelSet,
    camera: CameraSource,
}

impl Detector {
    /// Load the model and labels with the default backends and camera prefix.
    pub fn new<M: AsRef<Path>, L: AsRef<Path>>(model_path: M, labels_path: L) -> Self {
        Self::with_loader(
            &ModelLoader::with_default_backends(),
            model_path,
            labels_path,
            CameraSource::default(),
        )
    }

    pub fn from_config(cfg: &DetectorConfig) -> Self {
        Self::with_loader(
            &ModelLoader::with_default_backends(),
            &cfg.model_path,
            &cfg.labels_path,
            CameraSource::new(cfg.camera.device_prefix.clone()),
        )
    }

    /// Load through a caller-supplied backend list.
    pub fn with_loader<M: AsRef<Path>, L: AsRef<Path>>(
        loader: &ModelLoader,
        model_path: M,
        labels_path: L,
        camera: CameraSource,
    ) -> Self {
        let model = match loader.load(model_path) {
            Ok(model) => Some(model),
            Err(err) => {
                log::error!("{}; predictions will be unavailable", err);
                None
            }
        };
        let labels = LabelSet::load_or_empty(labels_path);
        Self::from_parts(model, labels, camera)
    }

    pub fn from_parts(model: Option<Model>, labels: LabelSet, camera: CameraSource) -> Self {
        Self {
            model,
            labels,
            camera,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Backend that loaded the model, if one did.
    pub fn model_backend(&self) -> Option<&'static str> {
        self.model.as_ref().map(Model::backend)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Open camera `index`. Any camera already open is released first.
    pub fn open_camera(&mut self, index: u32) -> bool {
        match self.camera.open(index) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("camera open failed: {:#}", err);
                false
            }
        }
    }

    pub fn close_camera(&mut self) {
        self.camera.close();
    }

    pub fn is_camera_open(&self) -> bool {
        self.camera.is_open()
    }

    /// Newest camera frame, or `None` when closed or capture failed.
    pub fn read_frame(&mut self) -> Option<Frame> {
        if !self.camera.is_open() {
            log::debug!("read_frame: camera is closed");
            return None;
        }
        match self.camera.read() {
            Ok(frame) => Some(frame),
            Err(err) => {
                log::warn!("frame capture failed: {:#}", err);
                None
            }
        }
    }

    /// Classify `frame`, or a fresh camera frame when `frame` is `None`.
    pub fn predict(&mut self, frame: Option<&Frame>) -> Option<PredictionResult> {
        if self.model.is_none() {
            log::debug!("predict: no model loaded");
            return None;
        }
        match frame {
            Some(frame) => inference::infer(self.model.as_ref(), &self.labels, Some(frame)),
            None => {
                let captured = self.read_frame();
                inference::infer(self.model.as_ref(), &self.labels, captured.as_ref())
            }
        }
    }

    /// Top-1 label when its confidence is at least `threshold`.
    pub fn get_label(&mut self, frame: Option<&Frame>, threshold: f32) -> Option<String> {
        self.predict(frame)
            .filter(|result| result.meets(threshold))
            .map(|result| result.label)
    }
}
