//! HTTP routes: health probe and prediction endpoint

use crate::error::ApiError;
use crate::features::parse_features;
use crate::metrics::{Outcome, ServiceMetrics};
use crate::models::InferenceEngine;
use crate::types::response::{HealthResponse, PredictionResponse};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{debug, error};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }
}

/// Build the router with any-origin CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn home() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();
    let result = handle_predict(&state, &body);
    let latency = start.elapsed();

    match result {
        Ok(response) => {
            state.metrics.record_request(Outcome::Success, latency);
            debug!(latency_us = latency.as_micros() as u64, "Prediction served");
            response
        }
        Err(err @ ApiError::BadRequest(_)) => {
            state.metrics.record_request(Outcome::BadRequest, latency);
            debug!(reason = %err, "Rejected prediction request");
            err.into_response()
        }
        Err(err) => {
            state.metrics.record_request(Outcome::ServerError, latency);
            error!(kind = err.kind(), error = %err, "Internal error during /predict");
            err.into_response()
        }
    }
}

fn handle_predict(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    if !state.engine.has_model() {
        return Err(ApiError::ModelUnavailable);
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Failed to decode JSON object: {e}")))?;
    let features = parse_features(&payload)?;

    let output = state
        .engine
        .predict(&features)?
        .ok_or(ApiError::ModelUnavailable)?;

    if state.engine.has_scaler() && !output.scaled {
        state.metrics.record_scaler_fallback();
    }

    Ok(Json(PredictionResponse::new(output.prediction, &features)).into_response())
}
