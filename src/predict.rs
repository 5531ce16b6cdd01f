//! Prediction service.
//!
//! Resolves the serving artifact through the cache, validates the request
//! against that artifact's stored schema, and returns a rounded price.
//! Column order always comes from the stored schema: an order mismatch
//! between training and inference would be a silent correctness bug, so
//! caller input order is never used.

use crate::cache::ModelCache;
use crate::error::Result;
use crate::schema;
use serde_json::Value;
use std::sync::Arc;

pub struct Predictor {
    cache: Arc<ModelCache>,
    round_decimals: u32,
}

impl Predictor {
    pub fn new(cache: Arc<ModelCache>, round_decimals: u32) -> Self {
        Self {
            cache,
            round_decimals,
        }
    }

    /// Produce a price estimate for one house.
    ///
    /// `ModelNotTrained` surfaces unchanged when nothing has been
    /// published; malformed input fails with `InvalidFeatures` and never
    /// produces a partial prediction. No side effects here; audit logging is
    /// the caller's concern.
    pub fn predict(&self, input: &Value) -> Result<f64> {
        let artifact = self.cache.get()?;
        let features = schema::extract_features(input, artifact.schema())?;
        let raw = artifact.pipeline.predict_one(&features);
        Ok(round_to(raw, self.round_decimals))
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
