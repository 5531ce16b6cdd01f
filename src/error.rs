use crate::store::ModelVersion;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("dataset schema error: {0}")]
    Schema(String),

    #[error("artifact not found for version {0}")]
    ArtifactNotFound(ModelVersion),

    #[error("artifact store corrupted: {0}")]
    Corrupted(String),

    #[error("no model has been trained yet")]
    ModelNotTrained,

    #[error("invalid features: {0}")]
    InvalidFeatures(String),

    #[error("a training run is already in progress")]
    TrainingInProgress,

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True for conditions the caller can recover from by retrying or
    /// fixing its input; storage and schema failures are not among them.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidFeatures(_) | Error::TrainingInProgress | Error::ModelNotTrained
        )
    }
}
