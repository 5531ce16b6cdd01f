use crate::schema::FeatureSchema;
use std::path::PathBuf;

/// Engine configuration.
///
/// Defaults mirror the production service: a flat CSV of
/// `size, bedrooms, age, price`, an 80/20 split with a fixed seed, and
/// prices rounded to two decimal places.
#[derive(Debug, Clone)]
pub struct HousecastConfig {
    /// Flat tabular training data, read fresh on every retrain.
    pub dataset_path: PathBuf,
    /// Root directory of the artifact store (versions, pointer, audit log).
    pub store_root: PathBuf,
    /// Feature schema used for training; serving always uses the schema
    /// stored with the artifact it is serving.
    pub schema: FeatureSchema,
    /// Fraction of rows held out for validation.
    pub holdout_ratio: f64,
    /// Seed for the train/validation shuffle; fixed for reproducible splits.
    pub split_seed: u64,
    /// Decimal places for returned prices.
    pub round_decimals: u32,
}

impl Default for HousecastConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/houses.csv"),
            store_root: PathBuf::from("models"),
            schema: FeatureSchema::default(),
            holdout_ratio: 0.2,
            split_seed: 42,
            round_decimals: 2,
        }
    }
}

impl HousecastConfig {
    /// Convenience constructor for the common case: everything default
    /// except the two paths.
    pub fn at<P: Into<PathBuf>>(dataset_path: P, store_root: P) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            store_root: store_root.into(),
            ..Self::default()
        }
    }
}
