//! ONNX Runtime backed artifacts

use super::{Prediction, Predictor, Transformer};
use anyhow::{anyhow, bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// A loaded ONNX graph taking one `[1, n]` float tensor.
struct OnnxSession {
    name: String,
    /// `Session::run` needs `&mut self`.
    session: Mutex<Session>,
}

impl OnnxSession {
    fn load(path: &Path, threads: usize) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx")
            .to_string();

        info!(artifact = %name, path = %path.display(), threads = threads, "Loading ONNX artifact");

        if !path.exists() {
            bail!("{} not found", path.display());
        }

        // Builder steps return the builder inside their error, so only the message is kept.
        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow!("Failed to set optimization level: {e}"))?
            .with_intra_threads(threads)
            .map_err(|e| anyhow!("Failed to set intra threads: {e}"))?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load ONNX graph from {}", path.display()))?;

        Ok(Self {
            name,
            session: Mutex::new(session),
        })
    }

    /// Run the graph on one row and return the first output, flattened.
    fn run(&self, features: &[f64]) -> Result<Vec<f64>> {
        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, row.len() as i64];
        let input =
            Tensor::from_array((shape, row)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Session lock poisoned: {e}"))?;

        let outputs = session
            .run(ort::inputs![input])
            .with_context(|| format!("{} inference failed", self.name))?;

        let (output_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| anyhow!("{} produced no outputs", self.name))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .with_context(|| format!("{} output '{output_name}' is not a float tensor", self.name))?;

        debug!(artifact = %self.name, output = %output_name, shape = ?shape, "ONNX run complete");

        Ok(data.iter().map(|&v| f64::from(v)).collect())
    }
}

/// Regressor exported to ONNX. Output is array-like and returned flattened.
pub struct OnnxModel {
    inner: OnnxSession,
}

impl OnnxModel {
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        Ok(Self {
            inner: OnnxSession::load(path.as_ref(), threads)?,
        })
    }
}

impl Predictor for OnnxModel {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction> {
        Ok(Prediction::Values(self.inner.run(features)?))
    }
}

/// Scaler exported to ONNX. Must return one value per input feature.
pub struct OnnxScaler {
    inner: OnnxSession,
}

impl OnnxScaler {
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        Ok(Self {
            inner: OnnxSession::load(path.as_ref(), threads)?,
        })
    }
}

impl Transformer for OnnxScaler {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        let scaled = self.inner.run(features)?;
        if scaled.len() != features.len() {
            bail!(
                "{} returned {} values for {} features",
                self.inner.name,
                scaled.len(),
                features.len()
            );
        }
        Ok(scaled)
    }
}
