//! Plain-parameter artifacts stored as JSON
//!
//! A linear regressor (`coefficients`, `intercept`) and a standard scaler
//! (`mean`, `scale`), for models exported without an ONNX graph.

use super::{Prediction, Predictor, Transformer};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn artifact_name(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(fallback)
        .to_string()
}

/// Linear regressor: `intercept + sum(coefficients[i] * x[i])`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    #[serde(skip, default = "default_model_name")]
    name: String,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

fn default_model_name() -> String {
    "linear".to_string()
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            name: default_model_name(),
            coefficients,
            intercept,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut model: LinearModel = read_json(path)?;
        if model.coefficients.is_empty() {
            bail!("{} has no coefficients", path.display());
        }
        model.name = artifact_name(path, "linear");
        Ok(model)
    }
}

impl Predictor for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction> {
        if features.len() != self.coefficients.len() {
            bail!(
                "X has {} features, but {} is expecting {} features as input",
                features.len(),
                self.name,
                self.coefficients.len()
            );
        }

        let value = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (c, x)| acc + c * x);

        Ok(Prediction::Scalar(value))
    }
}

/// Standardization: `(x - mean) / scale`
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    #[serde(skip, default = "default_scaler_name")]
    name: String,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

fn default_scaler_name() -> String {
    "standard_scaler".to_string()
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            name: default_scaler_name(),
            mean,
            scale,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut scaler: StandardScaler = read_json(path)?;
        if scaler.mean.len() != scaler.scale.len() {
            bail!(
                "{}: mean has {} entries but scale has {}",
                path.display(),
                scaler.mean.len(),
                scaler.scale.len()
            );
        }
        scaler.name = artifact_name(path, "standard_scaler");
        Ok(scaler)
    }
}

impl Transformer for StandardScaler {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.mean.len() || features.len() != self.scale.len() {
            bail!(
                "X has {} features, but {} is expecting {} features as input",
                features.len(),
                self.name,
                self.mean.len()
            );
        }

        let scaled: Vec<f64> = features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant features were fit with zero variance.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect();

        if scaled.iter().any(|v| !v.is_finite()) {
            bail!("{} produced non-finite values", self.name);
        }
        Ok(scaled)
    }
}
