#[cfg(feature = "backend-tract")]
pub mod tract;

#[cfg(feature = "backend-tract")]
pub use tract::{TractOptimizedBackend, TractTypedBackend};
