//! JSON response bodies

use crate::features::FeatureVector;
use crate::models::Prediction;
use serde::Serialize;

/// Units annotation attached to every prediction
pub const PREDICTION_UNITS: &str = "(same units as model target)";

/// Message returned by the health endpoint
pub const HEALTH_MESSAGE: &str = "Diabetes prediction API running.";

/// Body of a successful `/predict` call
#[derive(Debug, Serialize)]
pub struct PredictionResponse<'a> {
    pub prediction: Prediction,
    pub units: &'static str,
    /// The parsed request values, before any scaling
    pub input_features: &'a FeatureVector,
}

impl<'a> PredictionResponse<'a> {
    pub fn new(prediction: Prediction, input_features: &'a FeatureVector) -> Self {
        Self {
            prediction,
            units: PREDICTION_UNITS,
            input_features,
        }
    }
}

/// Body of `GET /`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            message: HEALTH_MESSAGE,
        }
    }
}
