use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ingest::DEFAULT_DEVICE_PREFIX;

const DEFAULT_MODEL_PATH: &str = "keras_model.onnx";
const DEFAULT_LABELS_PATH: &str = "labels.txt";
const DEFAULT_CAMERA_INDEX: u32 = 0;
pub const DEFAULT_THRESHOLD: f32 = 0.7;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    threshold: Option<f32>,
    camera: Option<CameraConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    index: Option<u32>,
    device_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub threshold: f32,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub index: u32,
    pub device_prefix: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::from_file(DetectorConfigFile::default())
    }
}

impl DetectorConfig {
    /// Defaults, then the TOML file named by `TM_DETECTOR_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TM_DETECTOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectorConfigFile) -> Self {
        let camera = CameraSettings {
            index: file
                .camera
                .as_ref()
                .and_then(|camera| camera.index)
                .unwrap_or(DEFAULT_CAMERA_INDEX),
            device_prefix: file
                .camera
                .and_then(|camera| camera.device_prefix)
                .unwrap_or_else(|| DEFAULT_DEVICE_PREFIX.to_string()),
        };
        Self {
            model_path: file
                .model_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            labels_path: file
                .labels_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LABELS_PATH)),
            threshold: file.threshold.unwrap_or(DEFAULT_THRESHOLD),
            camera,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("TM_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var("TM_LABELS_PATH") {
            if !path.trim().is_empty() {
                self.labels_path = PathBuf::from(path);
            }
        }
        if let Ok(prefix) = std::env::var("TM_CAMERA_DEVICE") {
            if !prefix.trim().is_empty() {
                self.camera.device_prefix = prefix;
            }
        }
        if let Ok(index) = std::env::var("TM_CAMERA_INDEX") {
            self.camera.index = index
                .trim()
                .parse()
                .map_err(|_| anyhow!("TM_CAMERA_INDEX must be a non-negative integer"))?;
        }
        if let Ok(threshold) = std::env::var("TM_THRESHOLD") {
            self.threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("TM_THRESHOLD must be a number between 0 and 1"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(anyhow!(
                "threshold must be between 0 and 1, got {}",
                self.threshold
            ));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(anyhow!("model path must not be empty"));
        }
        if self.labels_path.as_os_str().is_empty() {
            return Err(anyhow!("labels path must not be empty"));
        }
        if self.camera.device_prefix.trim().is_empty() {
            return Err(anyhow!("camera device prefix must not be empty"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<DetectorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
