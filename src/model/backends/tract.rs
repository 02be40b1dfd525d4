#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::inference::{InputTensor, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};
use crate::model::backend::{Classifier, ModelBackend};

type Plan = TypedRunnableModel<TypedModel>;

/// Tract ONNX backend with the graph optimizer enabled.
///
/// Loads a local model file with its input pinned to f32 (1, 224, 224, 3).
/// No network I/O; nothing is written to disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct TractOptimizedBackend;

/// Tract ONNX backend that skips graph optimization.
///
/// Slower, but accepts graphs the optimizer rejects.
#[derive(Clone, Copy, Debug, Default)]
pub struct TractTypedBackend;

impl ModelBackend for TractOptimizedBackend {
    fn name(&self) -> &'static str {
        "tract-optimized"
    }

    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let plan = read_model(path)?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        Ok(Box::new(TractClassifier {
            plan,
            name: self.name(),
        }))
    }
}

impl ModelBackend for TractTypedBackend {
    fn name(&self) -> &'static str {
        "tract-typed"
    }

    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let plan = read_model(path)?
            .into_typed()
            .context("failed to type ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        Ok(Box::new(TractClassifier {
            plan,
            name: self.name(),
        }))
    }
}

fn read_model(path: &Path) -> Result<InferenceModel> {
    tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("failed to load ONNX model from {}", path.display()))?
        .with_input_fact(
            0,
            InferenceFact::dt_shape(
                f32::datum_type(),
                tvec!(1, INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS),
            ),
        )
        .context("failed to set input fact")
}

struct TractClassifier {
    plan: Plan,
    name: &'static str,
}

impl Classifier for TractClassifier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn forward(&self, input: &InputTensor) -> Result<Vec<f32>> {
        let array = tract_ndarray::Array4::from_shape_vec(
            (1, INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS),
            input.as_slice().to_vec(),
        )
        .context("input tensor does not match (1, 224, 224, 3)")?;
        let outputs = self
            .plan
            .run(tvec!(array.into_tensor().into_tvalue()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok(scores.iter().copied().collect())
    }
}
