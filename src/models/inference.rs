//! Scale-then-predict inference engine

use super::loader::ArtifactLoader;
use super::{Predictor, Transformer};
use crate::config::ArtifactsConfig;
use crate::features::FeatureVector;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Normalized model output: a plain number or a flattened list of numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    Scalar(f64),
    Values(Vec<f64>),
}

impl Prediction {
    fn validate(self) -> Result<Self> {
        match &self {
            Prediction::Scalar(v) if !v.is_finite() => {
                bail!("model produced a non-finite prediction")
            }
            Prediction::Values(vs) if vs.is_empty() => bail!("model produced no output"),
            Prediction::Values(vs) if vs.iter().any(|v| !v.is_finite()) => {
                bail!("model produced a non-finite prediction")
            }
            _ => Ok(self),
        }
    }

    /// First output value, for logging.
    pub fn primary(&self) -> Option<f64> {
        match self {
            Prediction::Scalar(v) => Some(*v),
            Prediction::Values(vs) => vs.first().copied(),
        }
    }
}

/// Result of one inference pass
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub prediction: Prediction,
    /// False when no scaler is loaded or the scaler failed on this input.
    pub scaled: bool,
}

/// Holds the process-wide model and scaler. Read-only after construction.
pub struct InferenceEngine {
    model: Option<Box<dyn Predictor>>,
    scaler: Option<Box<dyn Transformer>>,
}

impl InferenceEngine {
    pub fn new(model: Option<Box<dyn Predictor>>, scaler: Option<Box<dyn Transformer>>) -> Self {
        Self { model, scaler }
    }

    /// Load both artifacts as configured. Never fails; missing artifacts stay unset.
    pub fn from_config(config: &ArtifactsConfig) -> Self {
        let loader = ArtifactLoader::from_config(config);
        info!(dir = %loader.dir().display(), "Loading artifacts");

        let engine = Self::new(
            loader.load_model(&config.model_file),
            loader.load_scaler(&config.scaler_file),
        );

        info!(
            model_loaded = engine.has_model(),
            scaler_loaded = engine.has_scaler(),
            "Inference engine initialized"
        );
        engine
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Apply the scaler, falling back to the raw row if it is absent or fails.
    fn scale(&self, raw: &[f64]) -> (Vec<f64>, bool) {
        let Some(scaler) = &self.scaler else {
            return (raw.to_vec(), false);
        };

        match scaler.transform(raw) {
            Ok(scaled) if scaled.len() == raw.len() => (scaled, true),
            Ok(scaled) => {
                warn!(
                    scaler = %scaler.name(),
                    expected = raw.len(),
                    got = scaled.len(),
                    "Scaler transform returned wrong width, using unscaled features"
                );
                (raw.to_vec(), false)
            }
            Err(e) => {
                warn!(
                    scaler = %scaler.name(),
                    error = %format!("{e:#}"),
                    "Scaler transform failed, using unscaled features"
                );
                (raw.to_vec(), false)
            }
        }
    }

    /// Run scale + predict on one feature vector.
    ///
    /// Returns `Ok(None)` when no model is loaded.
    pub fn predict(&self, features: &FeatureVector) -> Result<Option<InferenceOutput>> {
        let Some(model) = &self.model else {
            return Ok(None);
        };

        let (row, scaled) = self.scale(features.as_slice());

        let prediction = model
            .predict(&row)
            .and_then(Prediction::validate)
            .with_context(|| format!("{} prediction failed", model.name()))?;

        debug!(
            model = %model.name(),
            scaled = scaled,
            prediction = ?prediction.primary(),
            outputs = match &prediction {
                Prediction::Scalar(_) => 1,
                Prediction::Values(vs) => vs.len(),
            },
            "Inference complete"
        );

        Ok(Some(InferenceOutput { prediction, scaled }))
    }
}
