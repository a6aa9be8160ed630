//! Diabetes Prediction API - Main Entry Point
//!
//! Loads the model and scaler artifacts once, then serves `GET /` and
//! `POST /predict` until interrupted.

use anyhow::Result;
use diabetes_prediction_api::{
    config::{AppConfig, LoggingConfig},
    metrics::MetricsReporter,
    router, AppState, InferenceEngine, FEATURE_ORDER,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "diabetes_prediction_api={},tower_http=warn",
            config.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_logging(&config.logging)?;

    info!("Starting Diabetes Prediction API");
    info!(
        model_file = %config.artifacts.model_file,
        scaler_file = %config.artifacts.scaler_file,
        features = FEATURE_ORDER.len(),
        "Configuration loaded successfully"
    );

    // Artifact failures leave the engine degraded, never abort startup.
    let engine = InferenceEngine::from_config(&config.artifacts);
    if !engine.has_model() {
        warn!("No model loaded; /predict will return 500 until the artifact is fixed");
    }
    if !engine.has_scaler() {
        warn!("No scaler loaded; predictions will use unscaled features");
    }

    let state = AppState::new(engine);
    let metrics = state.metrics.clone();

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
