//! Camera frame classifier.
//!
//! This crate captures frames from a camera, classifies each one with a
//! pre-trained image model and reduces the output to a top-1 label and
//! confidence for downstream controllers.
//!
//! # Architecture
//!
//! - `model`: ordered `ModelBackend` fallback producing a `Model`
//! - `labels`: label file parsing (`LabelSet`)
//! - `ingest`: camera lifecycle (`CameraSource`)
//! - `inference`: preprocessing, forward pass, top-1 reduction
//! - `detector`: the `Detector` façade tying the above together
//! - `config`: file and environment configuration
//!
//! Every failure inside the detector degrades to an absent result plus a log
//! message. Nothing here panics or propagates an error to the caller of the
//! façade.

pub mod config;
pub mod detector;
pub mod frame;
pub mod inference;
pub mod ingest;
pub mod labels;
pub mod model;

pub use config::{CameraSettings, DetectorConfig, DEFAULT_THRESHOLD};
pub use detector::Detector;
pub use frame::Frame;
pub use inference::{InputTensor, PredictionResult};
pub use ingest::CameraSource;
pub use labels::LabelSet;
pub use model::{Classifier, LoadError, Model, ModelBackend, ModelLoader};
