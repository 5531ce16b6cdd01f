//! housecast: model lifecycle manager for house price prediction.
//!
//! Trains, versions, atomically persists, serves, and invalidates a linear
//! regression model shared between concurrent prediction readers and a
//! single background retraining writer. HTTP routing, job queues, and
//! audit databases are external collaborators; this crate is the core they
//! call into.
//!
//! ```no_run
//! use housecast::{HousecastConfig, PriceEngine};
//! use serde_json::json;
//!
//! let engine = PriceEngine::open(HousecastConfig::at("data/houses.csv", "models"))?;
//! let outcome = engine.retrain()?;
//! println!("published version {}", outcome.version);
//! let price = engine.predict(&json!({"size": 1200, "bedrooms": 2, "age": 8}))?;
//! println!("estimated price: {price:.2}");
//! # Ok::<(), housecast::Error>(())
//! ```

pub mod audit;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod predict;
pub mod schema;
pub mod store;
pub mod training;

pub use audit::{AuditLog, PredictionLog, TrainingRun};
pub use cache::{CacheStats, ModelCache};
pub use config::HousecastConfig;
pub use error::{Error, Result};
pub use model::FittedPipeline;
pub use orchestrator::{TrainingOrchestrator, TrainingOutcome};
pub use predict::Predictor;
pub use schema::FeatureSchema;
pub use store::{Artifact, ArtifactStore, ModelVersion};
pub use training::Metrics;

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// The assembled engine: artifact store, model cache, predictor,
/// orchestrator, and audit log wired together over one store root.
///
/// All methods take `&self`; share the engine across threads behind an
/// `Arc`; predictions are concurrent readers, retrain is the single
/// writer.
pub struct PriceEngine {
    config: HousecastConfig,
    store: Arc<ArtifactStore>,
    cache: Arc<ModelCache>,
    predictor: Predictor,
    orchestrator: TrainingOrchestrator,
    audit: Arc<AuditLog>,
}

impl PriceEngine {
    /// Open (creating if necessary) the store root and wire all components.
    pub fn open(config: HousecastConfig) -> Result<Self> {
        let store = Arc::new(ArtifactStore::open(&config.store_root)?);
        let cache = Arc::new(ModelCache::new(Arc::clone(&store)));
        let audit = Arc::new(AuditLog::open(&config.store_root)?);
        let predictor = Predictor::new(Arc::clone(&cache), config.round_decimals);
        let orchestrator = TrainingOrchestrator::new(
            &config,
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&audit),
        );
        Ok(Self {
            config,
            store,
            cache,
            predictor,
            orchestrator,
            audit,
        })
    }

    /// Train on the configured dataset and publish a new model version.
    /// Fails fast with `TrainingInProgress` if a run is already executing.
    pub fn retrain(&self) -> Result<TrainingOutcome> {
        self.orchestrator.retrain()
    }

    /// Serve one prediction and append a `PredictionLog` record.
    pub fn predict(&self, input: &Value) -> Result<f64> {
        let price = self.predictor.predict(input)?;
        self.audit.append_prediction(&PredictionLog {
            created_at: Utc::now(),
            input: input.clone(),
            predicted_price: price,
        })?;
        Ok(price)
    }

    /// The latest training run, for status reporting. `None` means no
    /// training has ever succeeded.
    pub fn status(&self) -> Result<Option<TrainingRun>> {
        self.audit.latest_training_run()
    }

    pub fn config(&self) -> &HousecastConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }
}
