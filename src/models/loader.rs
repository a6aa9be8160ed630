//! Startup loader for the model and scaler artifacts

use super::{LinearModel, OnnxModel, OnnxScaler, Predictor, StandardScaler, Transformer};
use crate::config::ArtifactsConfig;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// On-disk artifact format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Onnx,
    Json,
}

impl ArtifactKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("onnx") => Ok(ArtifactKind::Onnx),
            Some("json") => Ok(ArtifactKind::Json),
            _ => bail!(
                "Unsupported artifact format for {} (expected .onnx or .json)",
                path.display()
            ),
        }
    }
}

/// Loads artifacts from a single directory.
///
/// Failures never abort startup: the artifact is logged and left unset so the
/// server can still answer health checks.
pub struct ArtifactLoader {
    dir: PathBuf,
    onnx_threads: usize,
}

impl ArtifactLoader {
    pub fn new<P: Into<PathBuf>>(dir: P, onnx_threads: usize) -> Self {
        Self {
            dir: dir.into(),
            onnx_threads: onnx_threads.max(1),
        }
    }

    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self::new(config.resolve_dir(), config.onnx_threads)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn try_load_model(&self, path: &Path) -> Result<Box<dyn Predictor>> {
        Ok(match ArtifactKind::from_path(path)? {
            ArtifactKind::Onnx => Box::new(OnnxModel::load(path, self.onnx_threads)?),
            ArtifactKind::Json => Box::new(LinearModel::load(path)?),
        })
    }

    fn try_load_scaler(&self, path: &Path) -> Result<Box<dyn Transformer>> {
        Ok(match ArtifactKind::from_path(path)? {
            ArtifactKind::Onnx => Box::new(OnnxScaler::load(path, self.onnx_threads)?),
            ArtifactKind::Json => Box::new(StandardScaler::load(path)?),
        })
    }

    /// Load the model artifact, or `None` if it is missing or unreadable.
    pub fn load_model(&self, file_name: &str) -> Option<Box<dyn Predictor>> {
        let path = self.dir.join(file_name);
        match self.try_load_model(&path) {
            Ok(model) => {
                info!(model = %model.name(), path = %path.display(), "Model loaded successfully");
                Some(model)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "Could not load model");
                None
            }
        }
    }

    /// Load the scaler artifact, or `None` if it is missing or unreadable.
    pub fn load_scaler(&self, file_name: &str) -> Option<Box<dyn Transformer>> {
        let path = self.dir.join(file_name);
        match self.try_load_scaler(&path) {
            Ok(scaler) => {
                info!(scaler = %scaler.name(), path = %path.display(), "Scaler loaded successfully");
                Some(scaler)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "Could not load scaler");
                None
            }
        }
    }
}
