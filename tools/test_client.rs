//! Test Prediction Client
//!
//! Generates patient records and posts them to a running prediction API.
//!
//! Usage: test_client [base_url] [count] [high_risk_rate] [delay_ms]

use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, warn};

/// Patient record in the named-field request shape
#[derive(Debug, Clone, Serialize)]
#[allow(non_snake_case)]
struct Patient {
    Age: f64,
    Sex: f64,
    BMI: f64,
    Average_Blood_Pressure: f64,
    Cholesterol: f64,
    LDL: f64,
    HDL: f64,
    TotalCholesterol_to_HDL: f64,
    Triglycerides: f64,
    HbA1c: f64,
}

impl Patient {
    /// Values in canonical feature order, for the list request shape
    fn as_features(&self) -> [f64; 10] {
        [
            self.Age,
            self.Sex,
            self.BMI,
            self.Average_Blood_Pressure,
            self.Cholesterol,
            self.LDL,
            self.HDL,
            self.TotalCholesterol_to_HDL,
            self.Triglycerides,
            self.HbA1c,
        ]
    }
}

/// Patient generator for testing
struct PatientGenerator {
    rng: rand::rngs::ThreadRng,
}

impl PatientGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    fn round1(v: f64) -> f64 {
        (v * 10.0).round() / 10.0
    }

    /// Generate a patient with unremarkable measurements
    fn generate_typical(&mut self) -> Patient {
        let total: f64 = self.rng.gen_range(150.0..210.0);
        let hdl: f64 = self.rng.gen_range(45.0..75.0);

        Patient {
            Age: self.rng.gen_range(20..60) as f64,
            Sex: self.rng.gen_range(0..=1) as f64,
            BMI: Self::round1(self.rng.gen_range(19.0..27.0)),
            Average_Blood_Pressure: Self::round1(self.rng.gen_range(70.0..95.0)),
            Cholesterol: Self::round1(total),
            LDL: Self::round1(self.rng.gen_range(70.0..130.0)),
            HDL: Self::round1(hdl),
            TotalCholesterol_to_HDL: Self::round1(total / hdl),
            Triglycerides: Self::round1(self.rng.gen_range(60.0..150.0)),
            HbA1c: Self::round1(self.rng.gen_range(4.5..5.7)),
        }
    }

    /// Generate a patient with elevated risk markers
    fn generate_high_risk(&mut self) -> Patient {
        let total: f64 = self.rng.gen_range(220.0..300.0);
        let hdl: f64 = self.rng.gen_range(28.0..42.0);

        Patient {
            Age: self.rng.gen_range(50..85) as f64,
            Sex: self.rng.gen_range(0..=1) as f64,
            BMI: Self::round1(self.rng.gen_range(30.0..42.0)), // Obese
            Average_Blood_Pressure: Self::round1(self.rng.gen_range(100.0..130.0)),
            Cholesterol: Self::round1(total),
            LDL: Self::round1(self.rng.gen_range(150.0..220.0)),
            HDL: Self::round1(hdl),
            TotalCholesterol_to_HDL: Self::round1(total / hdl),
            Triglycerides: Self::round1(self.rng.gen_range(200.0..450.0)),
            HbA1c: Self::round1(self.rng.gen_range(6.5..10.0)), // Diabetic range
        }
    }
}

/// Positional command-line options
#[derive(Debug, PartialEq)]
struct ClientArgs {
    base_url: String,
    count: u64,
    high_risk_rate: f64,
    delay_ms: u64,
}

impl ClientArgs {
    /// Parse `[base_url] [count] [high_risk_rate] [delay_ms]`; unparseable values fall back to defaults.
    fn parse(args: &[String]) -> Self {
        Self {
            base_url: args
                .get(1)
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:5000".to_string()),
            count: args.get(2).and_then(|s| s.parse::<u64>().ok()).unwrap_or(20),
            high_risk_rate: args
                .get(3)
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(0.2_f64)
                .clamp(0.0, 1.0),
            delay_ms: args.get(4).and_then(|s| s.parse::<u64>().ok()).unwrap_or(100),
        }
    }
}

/// Alternate between the two accepted request shapes
fn payload_for(patient: &Patient, index: u64) -> anyhow::Result<Value> {
    if index % 2 == 0 {
        Ok(json!({ "features": patient.as_features() }))
    } else {
        Ok(serde_json::to_value(patient)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Prediction Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let ClientArgs {
        base_url,
        count,
        high_risk_rate,
        delay_ms,
    } = ClientArgs::parse(&args);

    info!(
        base_url = %base_url,
        count = count,
        high_risk_rate = high_risk_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // Health probe
    match client.get(format!("{base_url}/")).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body: Value = resp.json().await?;
            info!(status = %body["status"], message = %body["message"], "Server is up");
        }
        Ok(resp) => {
            warn!(status = %resp.status(), "Health check failed. Running in dry-run mode.");
            return run_dry_mode(count, high_risk_rate, delay_ms).await;
        }
        Err(e) => {
            warn!(error = %e, "Server unreachable. Running in dry-run mode.");
            return run_dry_mode(count, high_risk_rate, delay_ms).await;
        }
    }

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();

    let mut succeeded = 0u64;
    let mut failed = 0u64;

    for i in 0..count {
        let (patient, label) = if rng.gen_bool(high_risk_rate) {
            (generator.generate_high_risk(), "high_risk")
        } else {
            (generator.generate_typical(), "typical")
        };
        let payload = payload_for(&patient, i)?;

        match client
            .post(format!("{base_url}/predict"))
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status();
                let body: Value = resp.json().await.unwrap_or(Value::Null);
                if status.is_success() {
                    succeeded += 1;
                    info!(
                        request = i + 1,
                        profile = label,
                        age = patient.Age,
                        hba1c = patient.HbA1c,
                        prediction = %body["prediction"],
                        "Prediction received"
                    );
                } else {
                    failed += 1;
                    warn!(
                        request = i + 1,
                        status = %status,
                        error = %body["error"],
                        message = %body["message"],
                        "Prediction rejected"
                    );
                }
            }
            Err(e) => {
                failed += 1;
                error!(request = i + 1, error = %e, "Request failed");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} succeeded, {} failed)",
        count, succeeded, failed
    );

    Ok(())
}

async fn run_dry_mode(count: u64, high_risk_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no server connection)");

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let patient = if rng.gen_bool(high_risk_rate) {
            generator.generate_high_risk()
        } else {
            generator.generate_typical()
        };

        let json = serde_json::to_string_pretty(&payload_for(&patient, i)?)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample payload {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
