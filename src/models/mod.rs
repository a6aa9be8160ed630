//! Model and scaler artifacts, loading, and inference

pub mod inference;
pub mod linear;
pub mod loader;
pub mod onnx;

use anyhow::Result;

pub use inference::{InferenceEngine, InferenceOutput, Prediction};
pub use linear::{LinearModel, StandardScaler};
pub use loader::{ArtifactKind, ArtifactLoader};
pub use onnx::{OnnxModel, OnnxScaler};

/// A pretrained regressor mapping one feature row to its raw output values.
///
/// Loaded once at startup and shared read-only across requests.
pub trait Predictor: Send + Sync {
    /// Artifact name used in logs.
    fn name(&self) -> &str;

    fn predict(&self, features: &[f64]) -> Result<Prediction>;
}

/// A pre-fit transform applied to a feature row before prediction.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &str;

    /// Returns a row of the same length as the input.
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}
