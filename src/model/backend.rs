use std::path::Path;

use anyhow::Result;

use crate::inference::InputTensor;

/// A loaded classifier that maps one input tensor to a class-probability vector.
pub trait Classifier: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run a forward pass.
    ///
    /// The input is always shaped (1, 224, 224, 3). The returned vector has one
    /// entry per class, in model output order.
    fn forward(&self, input: &InputTensor) -> Result<Vec<f32>>;
}

/// A way of turning a model artifact on disk into a `Classifier`.
///
/// `ModelLoader` tries backends in registration order and keeps the first
/// one that succeeds.
pub trait ModelBackend {
    /// Backend identifier, used in load diagnostics.
    fn name(&self) -> &'static str;

    /// Load the artifact at `path`.
    fn load(&self, path: &Path) -> Result<Box<dyn Classifier>>;
}
