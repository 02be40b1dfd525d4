//! tm_detect - classify camera frames (or a still image) and print the top label.
//!
//! Settings come from `TM_DETECTOR_CONFIG` / `TM_*` env vars, then flags.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tm_detector::{Detector, DetectorConfig, PredictionResult};

const BAR_WIDTH: usize = 20;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Model file (overrides config).
    #[arg(long)]
    model: Option<PathBuf>,
    /// Label file (overrides config).
    #[arg(long)]
    labels: Option<PathBuf>,
    /// Camera index (overrides config).
    #[arg(long)]
    camera: Option<u32>,
    /// Camera device prefix, e.g. /dev/video or stub://camera.
    #[arg(long)]
    device_prefix: Option<String>,
    /// Minimum confidence for a label to be reported.
    #[arg(long)]
    threshold: Option<f32>,
    /// Classify this image once instead of reading the camera.
    #[cfg(feature = "frame-image")]
    #[arg(long)]
    image: Option<PathBuf>,
    /// Stop after this many predictions (0 runs until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    frames: u64,
    /// Pause between predictions.
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,
    /// Print each prediction as a JSON line.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = DetectorConfig::load()?;
    if let Some(model) = &args.model {
        cfg.model_path = model.clone();
    }
    if let Some(labels) = &args.labels {
        cfg.labels_path = labels.clone();
    }
    if let Some(index) = args.camera {
        cfg.camera.index = index;
    }
    if let Some(prefix) = &args.device_prefix {
        cfg.camera.device_prefix = prefix.clone();
    }
    if let Some(threshold) = args.threshold {
        cfg.threshold = threshold;
    }
    cfg.validate()?;

    let mut detector = Detector::from_config(&cfg);
    if !detector.has_model() {
        log::warn!("running without a model; no predictions will be produced");
    }

    #[cfg(feature = "frame-image")]
    {
        if let Some(path) = &args.image {
            let frame = tm_detector::Frame::open(path)?;
            let result = detector.predict(Some(&frame));
            report(result.as_ref(), cfg.threshold, args.json)?;
            return Ok(());
        }
    }

    if !detector.open_camera(cfg.camera.index) {
        return Err(anyhow!(
            "could not open camera {}{}",
            cfg.camera.device_prefix,
            cfg.camera.index
        ));
    }

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    log::info!("classifying frames (Ctrl-C to stop)");
    let interval = Duration::from_millis(args.interval_ms);
    let mut count = 0u64;
    let outcome = loop {
        if !running.load(Ordering::SeqCst) {
            break Ok(());
        }
        if args.frames > 0 && count >= args.frames {
            break Ok(());
        }

        let result = detector.predict(None);
        if let Err(err) = report(result.as_ref(), cfg.threshold, args.json) {
            break Err(err);
        }
        count += 1;
        std::thread::sleep(interval);
    };

    detector.close_camera();
    if !args.json {
        println!();
    }
    log::info!("stopped after {} predictions", count);
    outcome
}

fn report(result: Option<&PredictionResult>, threshold: f32, json: bool) -> Result<()> {
    let Some(result) = result else {
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }

    let filled = ((result.confidence.clamp(0.0, 1.0)) * BAR_WIDTH as f32) as usize;
    let marker = if result.meets(threshold) { "" } else { " (below threshold)" };
    print!(
        "\r{}: {:>3.0}% {:<width$}{}",
        result.label,
        result.confidence * 100.0,
        "#".repeat(filled),
        marker,
        width = BAR_WIDTH
    );
    std::io::stdout().flush()?;
    Ok(())
}
