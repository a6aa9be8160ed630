//! Diabetes Prediction API Library
//!
//! Serves a pretrained diabetes regression model over HTTP. Requests carry ten
//! clinical measurements which are validated, optionally scaled, and passed
//! to the model.

pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::ApiError;
pub use features::{parse_features, FeatureVector, FEATURE_ORDER};
pub use metrics::ServiceMetrics;
pub use models::inference::InferenceEngine;
pub use server::{router, AppState};
