use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use tm_detector::config::DetectorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "TM_DETECTOR_CONFIG",
        "TM_MODEL_PATH",
        "TM_LABELS_PATH",
        "TM_CAMERA_INDEX",
        "TM_CAMERA_DEVICE",
        "TM_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        model_path = "models/hamster.onnx"
        labels_path = "models/labels.txt"
        threshold = 0.8

        [camera]
        index = 1
        device_prefix = "stub://bench"
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");

    std::env::set_var("TM_DETECTOR_CONFIG", file.path());
    std::env::set_var("TM_CAMERA_INDEX", "2");
    std::env::set_var("TM_THRESHOLD", "0.65");

    let cfg = DetectorConfig::load().expect("load config");

    assert_eq!(cfg.model_path, PathBuf::from("models/hamster.onnx"));
    assert_eq!(cfg.labels_path, PathBuf::from("models/labels.txt"));
    assert_eq!(cfg.camera.device_prefix, "stub://bench");
    assert_eq!(cfg.camera.index, 2);
    assert_eq!(cfg.threshold, 0.65);

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("TM_MODEL_PATH", "other.onnx");
    let cfg = DetectorConfig::load().expect("load config");
    assert_eq!(cfg.model_path, PathBuf::from("other.onnx"));
    assert_eq!(cfg.labels_path, PathBuf::from("labels.txt"));
    assert_eq!(cfg.camera.index, 0);
    assert_eq!(cfg.threshold, 0.7);

    clear_env();
}

#[test]
fn invalid_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("TM_THRESHOLD", "1.2");
    assert!(DetectorConfig::load().is_err());

    std::env::set_var("TM_THRESHOLD", "high");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    std::env::set_var("TM_CAMERA_INDEX", "-1");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    std::env::set_var("TM_DETECTOR_CONFIG", "/nonexistent/detector.toml");
    assert!(DetectorConfig::load().is_err());
    clear_env();
}
