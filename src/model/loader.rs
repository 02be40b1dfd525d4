use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::inference::InputTensor;

use super::backend::{Classifier, ModelBackend};

/// A loaded classifier together with the backend that produced it.
pub struct Model {
    classifier: Box<dyn Classifier>,
    backend: &'static str,
}

impl Model {
    pub fn new(backend: &'static str, classifier: Box<dyn Classifier>) -> Self {
        Self {
            classifier,
            backend,
        }
    }

    /// Name of the backend that loaded this model.
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn forward(&self, input: &InputTensor) -> Result<Vec<f32>> {
        self.classifier.forward(input)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("backend", &self.backend)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

/// Why no backend could load a model.
#[derive(Debug)]
pub enum LoadError {
    /// The loader had nothing to try.
    NoBackends { path: PathBuf },
    /// Every backend was tried and failed, in order.
    AllBackendsFailed {
        path: PathBuf,
        attempts: Vec<(&'static str, String)>,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NoBackends { path } => {
                write!(f, "no model backends available to load {}", path.display())
            }
            LoadError::AllBackendsFailed { path, attempts } => {
                write!(f, "failed to load model {}", path.display())?;
                for (backend, message) in attempts {
                    write!(f, "; {}: {}", backend, message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Ordered list of model backends.
///
/// `load` tries each backend in registration order and returns the first
/// model that loads.
#[derive(Default)]
pub struct ModelLoader {
    backends: Vec<Box<dyn ModelBackend>>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Loader with every backend compiled into this build, most preferred first.
    pub fn with_default_backends() -> Self {
        #[allow(unused_mut)]
        let mut loader = Self::new();
        #[cfg(feature = "backend-tract")]
        {
            loader.register(super::TractOptimizedBackend);
            loader.register(super::TractTypedBackend);
        }
        loader
    }

    /// Append a backend. Earlier registrations are tried first.
    pub fn register<B: ModelBackend + 'static>(&mut self, backend: B) {
        self.backends.push(Box::new(backend));
    }

    /// Backend names in the order they will be tried.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Model, LoadError> {
        let path = path.as_ref();
        if self.backends.is_empty() {
            return Err(LoadError::NoBackends {
                path: path.to_path_buf(),
            });
        }

        let mut attempts = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            match backend.load(path) {
                Ok(classifier) => {
                    log::info!("model loaded from {} via {}", path.display(), backend.name());
                    return Ok(Model::new(backend.name(), classifier));
                }
                Err(err) => {
                    log::warn!("model backend {} failed: {:#}", backend.name(), err);
                    attempts.push((backend.name(), format!("{:#}", err)));
                }
            }
        }

        Err(LoadError::AllBackendsFailed {
            path: path.to_path_buf(),
            attempts,
        })
    }
}
