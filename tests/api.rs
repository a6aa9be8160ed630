//! End-to-end tests of the HTTP surface, driven in-process.

use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use diabetes_prediction_api::config::ArtifactsConfig;
use diabetes_prediction_api::models::{
    LinearModel, Prediction, Predictor, StandardScaler, Transformer,
};
use diabetes_prediction_api::{router, AppState, InferenceEngine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::sync::atomic::Ordering;
use tower::ServiceExt;

const LIST_PAYLOAD: &str = r#"{"features":[45,1,27.5,80,190,110,50,3.8,150,6.1]}"#;

fn named_payload() -> Value {
    json!({
        "Age": 45,
        "Sex": 1,
        "BMI": 27.5,
        "Average_Blood_Pressure": 80,
        "Cholesterol": 190,
        "LDL": 110,
        "HDL": 50,
        "TotalCholesterol_to_HDL": 3.8,
        "Triglycerides": 150,
        "HbA1c": 6.1
    })
}

fn weighted_model() -> LinearModel {
    LinearModel::new(
        vec![0.5, -1.0, 2.0, 0.1, 0.01, 0.02, -0.03, 1.5, 0.05, 4.0],
        100.0,
    )
}

fn identity_scaler() -> StandardScaler {
    StandardScaler::new(vec![0.0; 10], vec![1.0; 10])
}

struct FailingModel;

impl Predictor for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _features: &[f64]) -> Result<Prediction> {
        Err(anyhow!("tensor shape mismatch"))
    }
}

struct FailingScaler;

impl Transformer for FailingScaler {
    fn name(&self) -> &str {
        "failing_scaler"
    }

    fn transform(&self, _features: &[f64]) -> Result<Vec<f64>> {
        Err(anyhow!("scaler was fit on a different feature set"))
    }
}

/// Echoes the first input value as an array-like output, so scaling is observable.
struct EchoModel;

impl Predictor for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction> {
        Ok(Prediction::Values(vec![features[0]]))
    }
}

fn state_with(
    model: Option<Box<dyn Predictor>>,
    scaler: Option<Box<dyn Transformer>>,
) -> AppState {
    AppState::new(InferenceEngine::new(model, scaler))
}

fn default_state() -> AppState {
    state_with(
        Some(Box::new(weighted_model())),
        Some(Box::new(identity_scaler())),
    )
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post_predict(state: AppState, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    send(state, request).await
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(state_with(None, None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn list_payload_predicts() {
    let (status, body) = post_predict(default_state(), LIST_PAYLOAD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["prediction"].is_number());
    assert_eq!(body["units"], "(same units as model target)");
    assert_eq!(body["input_features"]["Age"], 45.0);
    assert_eq!(body["input_features"]["HbA1c"], 6.1);
    assert_eq!(body["input_features"].as_object().unwrap().len(), 10);
}

#[tokio::test]
async fn named_payload_matches_list_payload() {
    let (_, from_list) = post_predict(default_state(), LIST_PAYLOAD).await;
    let (status, from_named) =
        post_predict(default_state(), named_payload().to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(from_list, from_named);
}

#[tokio::test]
async fn named_payload_key_order_and_extras_are_ignored() {
    let shuffled = r#"{"HbA1c":6.1,"Note":"x","Triglycerides":150,"TotalCholesterol_to_HDL":3.8,
        "HDL":50,"LDL":110,"Cholesterol":190,"Average_Blood_Pressure":80,"BMI":27.5,"Sex":1,"Age":45}"#;

    let (_, expected) = post_predict(default_state(), LIST_PAYLOAD).await;
    let (status, body) = post_predict(default_state(), shuffled).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn short_feature_list_is_bad_request() {
    let (status, body) = post_predict(default_state(), r#"{"features":[1,2,3]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad request");
    assert!(body["message"].as_str().unwrap().contains("Expected 10"));
}

#[tokio::test]
async fn empty_object_is_bad_request() {
    let (status, body) = post_predict(default_state(), "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Age"));
}

#[tokio::test]
async fn missing_field_names_the_field() {
    let mut payload = named_payload();
    payload.as_object_mut().unwrap().remove("Cholesterol");

    let (status, body) = post_predict(default_state(), payload.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Missing feature: Cholesterol"));
}

#[tokio::test]
async fn non_numeric_values_are_bad_request() {
    let (status, _) = post_predict(
        default_state(),
        r#"{"features":[45,"one",27.5,80,190,110,50,3.8,150,6.1]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut payload = named_payload();
    payload["BMI"] = json!({"value": 27.5});
    let (status, _) = post_predict(default_state(), payload.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    for body in ["{not json", "", "[1, 2, 3]"] {
        let (status, response) = post_predict(default_state(), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body:?}");
        assert_eq!(response["error"], "bad request");
    }
}

#[tokio::test]
async fn missing_model_is_server_error_for_any_payload() {
    for body in [LIST_PAYLOAD, "{}", "{not json"] {
        let state = state_with(None, Some(Box::new(identity_scaler())));
        let (status, response) = post_predict(state, body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response["error"], "model_unavailable");
        assert!(response["message"].as_str().unwrap().contains("not loaded"));
    }
}

#[tokio::test]
async fn model_failure_is_server_error() {
    let state = state_with(Some(Box::new(FailingModel)), None);
    let metrics = state.metrics.clone();

    let (status, body) = post_predict(state, LIST_PAYLOAD).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_server_error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("tensor shape mismatch"));
    assert_eq!(metrics.server_errors.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn scaler_failure_falls_back_to_raw_features() {
    let state = state_with(Some(Box::new(EchoModel)), Some(Box::new(FailingScaler)));
    let metrics = state.metrics.clone();

    let (status, body) = post_predict(state, LIST_PAYLOAD).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!([45.0]));
    assert_eq!(metrics.scaler_fallbacks.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn scaled_input_reaches_model_but_echo_is_raw() {
    let mut mean = vec![0.0; 10];
    mean[0] = 40.0;
    let scaler = StandardScaler::new(mean, vec![5.0; 10]);
    let state = state_with(Some(Box::new(EchoModel)), Some(Box::new(scaler)));

    let (status, body) = post_predict(state, LIST_PAYLOAD).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!([1.0]));
    assert_eq!(body["input_features"]["Age"], 45.0);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/predict")
        .header(header::ORIGIN, "https://frontend.example.web.app")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = router(default_state()).oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn artifacts_load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("reni_model.json"),
        json!({"coefficients": [1, 0, 0, 0, 0, 0, 0, 0, 0, 0], "intercept": 0.5}).to_string(),
    )
    .unwrap();
    fs::write(
        dir.path().join("reni_scaler.json"),
        json!({"mean": vec![0; 10], "scale": vec![1; 10]}).to_string(),
    )
    .unwrap();

    let config = ArtifactsConfig {
        dir: Some(dir.path().to_string_lossy().into_owned()),
        model_file: "reni_model.json".to_string(),
        scaler_file: "reni_scaler.json".to_string(),
        onnx_threads: 1,
    };
    let engine = InferenceEngine::from_config(&config);
    assert!(engine.has_model());
    assert!(engine.has_scaler());

    let (status, body) = post_predict(AppState::new(engine), LIST_PAYLOAD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 45.5);
}

#[tokio::test]
async fn corrupt_artifacts_degrade_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("reni_model.json"), "garbage").unwrap();

    let config = ArtifactsConfig {
        dir: Some(dir.path().to_string_lossy().into_owned()),
        model_file: "reni_model.json".to_string(),
        scaler_file: "reni_scaler.json".to_string(),
        onnx_threads: 1,
    };
    let engine = InferenceEngine::from_config(&config);
    assert!(!engine.has_model());
    assert!(!engine.has_scaler());

    let state = AppState::new(engine);
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, _) = send(state.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_predict(state, LIST_PAYLOAD).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
