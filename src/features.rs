//! Feature parsing and validation for diabetes model inference.
//!
//! Request bodies arrive as loosely shaped JSON. This module turns them into
//! a [`FeatureVector`] in the exact order the model was trained on.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Number of features the model expects.
pub const FEATURE_COUNT: usize = 10;

/// Canonical feature names, in training order.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "Age",
    "Sex",
    "BMI",
    "Average_Blood_Pressure",
    "Cholesterol",
    "LDL",
    "HDL",
    "TotalCholesterol_to_HDL",
    "Triglycerides",
    "HbA1c",
];

/// Client-caused parse failure. The message is returned to the caller as-is.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct FeatureError(String);

impl FeatureError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Ten clinical measurements in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Iterate `(name, value)` pairs in canonical order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_ORDER.iter().copied().zip(self.0.iter().copied())
    }
}

// Serialized as a name -> value object that keeps canonical order on the wire.
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.named() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Parse a request payload into a [`FeatureVector`].
///
/// Two shapes are accepted, checked in this order:
/// 1. `{"features": [v0, ..., v9]}`
/// 2. `{"Age": .., "Sex": .., ...}` with every canonical name present
///
/// Extra keys are ignored in both shapes. Values are not range-checked.
pub fn parse_features(payload: &Value) -> Result<FeatureVector, FeatureError> {
    let object = payload.as_object().ok_or_else(|| {
        FeatureError::new(
            "JSON payload must be an object with either a 'features' list or named feature keys.",
        )
    })?;

    match object.get("features") {
        Some(features) => parse_list(features),
        None => parse_named(object),
    }
}

fn parse_list(features: &Value) -> Result<FeatureVector, FeatureError> {
    let items = features
        .as_array()
        .ok_or_else(|| FeatureError::new("'features' must be a list of numeric values."))?;

    if items.len() != FEATURE_COUNT {
        return Err(FeatureError::new(format!(
            "Expected {} features but got {}.",
            FEATURE_COUNT,
            items.len()
        )));
    }

    let mut values = [0.0; FEATURE_COUNT];
    for (i, item) in items.iter().enumerate() {
        values[i] = coerce(item, || format!("features[{i}]"))?;
    }
    Ok(FeatureVector(values))
}

fn parse_named(object: &Map<String, Value>) -> Result<FeatureVector, FeatureError> {
    let mut values = [0.0; FEATURE_COUNT];
    for (i, name) in FEATURE_ORDER.iter().enumerate() {
        let value = object.get(*name).ok_or_else(|| {
            FeatureError::new(format!(
                "Missing feature: {}. Expected keys: {}",
                name,
                FEATURE_ORDER.join(", ")
            ))
        })?;
        values[i] = coerce(value, || (*name).to_string())?;
    }
    Ok(FeatureVector(values))
}

/// Coerce a JSON value to a finite `f64`.
///
/// Numbers, booleans and numeric strings are accepted.
fn coerce(value: &Value, label: impl FnOnce() -> String) -> Result<f64, FeatureError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(FeatureError::new(format!(
            "Feature '{}' must be numeric, got {}.",
            label(),
            value
        ))),
    }
}
