use std::collections::BTreeMap;

use serde::Serialize;

/// Outcome of classifying one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Index of the top-1 class.
    pub index: usize,
    /// Name of the top-1 class, or `class_<index>` when the label set is short.
    pub label: String,
    /// Probability of the top-1 class.
    pub confidence: f32,
    /// Probability per class name.
    pub all: BTreeMap<String, f32>,
    /// Raw output vector, index-aligned with the model.
    pub scores: Vec<f32>,
}

impl PredictionResult {
    /// True when the top-1 confidence clears `threshold` (inclusive).
    pub fn meets(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}
