//! Training orchestration.
//!
//! Runs the full retrain cycle behind a single-flight gate: load the
//! dataset, fit the pipeline, publish, invalidate the local cache, record
//! the audit row. A second concurrent call fails fast with
//! `TrainingInProgress` rather than queueing, so the external trigger
//! endpoint should answer immediately, and retry policy belongs to the job
//! queue. A failure at any step aborts before publish, so the previously
//! published version keeps serving.

use crate::audit::{AuditLog, TrainingRun};
use crate::cache::ModelCache;
use crate::config::HousecastConfig;
use crate::dataset;
use crate::error::{Error, Result};
use crate::schema::FeatureSchema;
use crate::store::{ArtifactStore, ModelVersion};
use crate::training::{self, Metrics, TrainOptions};
use chrono::Utc;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct TrainingOutcome {
    pub version: ModelVersion,
    pub metrics: Metrics,
}

pub struct TrainingOrchestrator {
    dataset_path: PathBuf,
    schema: FeatureSchema,
    options: TrainOptions,
    store: Arc<ArtifactStore>,
    cache: Arc<ModelCache>,
    audit: Arc<AuditLog>,
    gate: Mutex<()>,
}

impl TrainingOrchestrator {
    pub fn new(
        config: &HousecastConfig,
        store: Arc<ArtifactStore>,
        cache: Arc<ModelCache>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            dataset_path: config.dataset_path.clone(),
            schema: config.schema.clone(),
            options: TrainOptions {
                holdout_ratio: config.holdout_ratio,
                seed: config.split_seed,
            },
            store,
            cache,
            audit,
            gate: Mutex::new(()),
        }
    }

    /// Run one training cycle to completion and publish the result.
    ///
    /// At most one run executes at a time; overlapping calls fail fast
    /// with `TrainingInProgress`. Training is CPU-bound and synchronous;
    /// a caller that stops waiting does not stop the run.
    pub fn retrain(&self) -> Result<TrainingOutcome> {
        let _gate = self.gate.try_lock().ok_or(Error::TrainingInProgress)?;

        info!(dataset = %self.dataset_path.display(), "training run started");
        let table = dataset::load(&self.dataset_path, &self.schema)?;
        let (pipeline, metrics) = training::fit(&table, &self.options)?;
        let version = self.store.publish(&pipeline, &metrics)?;
        self.cache.invalidate();

        self.audit.append_training_run(&TrainingRun {
            created_at: Utc::now(),
            dataset_rows: metrics.rows,
            r2_score: metrics.r2,
            mae: metrics.mae,
            version,
        })?;

        info!(
            version = %version,
            rows = metrics.rows,
            mae = metrics.mae,
            r2 = metrics.r2,
            "training run published"
        );
        Ok(TrainingOutcome { version, metrics })
    }
}
