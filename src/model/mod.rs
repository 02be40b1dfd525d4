mod backend;
mod backends;
mod loader;

pub use backend::{Classifier, ModelBackend};
#[cfg(feature = "backend-tract")]
pub use backends::{TractOptimizedBackend, TractTypedBackend};
pub use loader::{LoadError, Model, ModelLoader};
