//! Type definitions for the prediction API

pub mod response;

pub use response::{HealthResponse, PredictionResponse};
