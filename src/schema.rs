//! Feature schema and input coercion.
//!
//! The schema stored with an artifact is the single source of truth for
//! which fields a prediction request must carry and for the column order
//! fed to the model. Caller input order is never trusted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered numeric feature names plus the target column name.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct FeatureSchema {
    pub features: Vec<String>,
    pub target: String,
}

impl FeatureSchema {
    pub fn new<S: Into<String>>(features: Vec<S>, target: S) -> Self {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            target: target.into(),
        }
    }

    /// Number of input features the model consumes.
    pub fn arity(&self) -> usize {
        self.features.len()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(vec!["size", "bedrooms", "age"], "price")
    }
}

/// Validate a loosely-typed JSON object against `schema` and return the
/// feature values in schema order.
///
/// Every schema feature must be present and coercible to a finite f64.
/// JSON numbers and numeric strings are accepted; anything else fails with
/// `InvalidFeatures`. There is no partial prediction.
pub fn extract_features(input: &Value, schema: &FeatureSchema) -> Result<Vec<f64>> {
    let obj = input
        .as_object()
        .ok_or_else(|| Error::InvalidFeatures("expected a JSON object".to_string()))?;

    let mut values = Vec::with_capacity(schema.arity());
    for name in &schema.features {
        let raw = obj
            .get(name)
            .ok_or_else(|| Error::InvalidFeatures(format!("missing field `{name}`")))?;
        values.push(coerce_numeric(name, raw)?);
    }
    Ok(values)
}

fn coerce_numeric(name: &str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InvalidFeatures(format!(
            "field `{name}` is not numeric: {value}"
        ))),
    }
}
