//! HTTP-facing error type for the prediction API

use crate::features::FeatureError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Every failure the handlers can report, mapped to a status code and JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-caused: malformed JSON, wrong shape, wrong count, missing or non-numeric field.
    #[error("{0}")]
    BadRequest(String),

    /// No model artifact was loaded at startup.
    #[error("Model not loaded on server.")]
    ModelUnavailable,

    /// Prediction failure or any other unexpected error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelUnavailable | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short error kind placed in the `error` field of the body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad request",
            ApiError::ModelUnavailable => "model_unavailable",
            ApiError::Internal(_) => "internal_server_error",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<FeatureError> for ApiError {
    fn from(err: FeatureError) -> Self {
        ApiError::BadRequest(err.message().to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{err:#}"))
    }
}

/// JSON error payload: `{"error": <kind>, "message": <reason>}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
