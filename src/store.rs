//! Versioned artifact store with atomic publish.
//!
//! Every publish writes a fresh, immutable version directory and only then
//! swaps the `CURRENT` pointer, both through temp-write + fsync + rename.
//! A concurrent reader sees either the previous version or the new one,
//! never a partially-written artifact.
//!
//! Layout under the store root:
//!
//! ```text
//! versions/v00000001/{pipeline.bin, scaler.bin, metadata.json}
//! versions/v00000002/...
//! CURRENT
//! ```

use crate::error::{Error, Result};
use crate::model::{FittedPipeline, StandardScaler};
use crate::schema::FeatureSchema;
use crate::training::Metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const VERSIONS_DIR: &str = "versions";
const CURRENT_FILE: &str = "CURRENT";
const PIPELINE_FILE: &str = "pipeline.bin";
const SCALER_FILE: &str = "scaler.bin";
const METADATA_FILE: &str = "metadata.json";

/// Immutable, monotonically increasing identifier of one published artifact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ModelVersion(pub u64);

impl ModelVersion {
    fn dirname(self) -> String {
        format!("v{:08}", self.0)
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything recorded about a version besides the parameter bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub version: ModelVersion,
    pub created_at: DateTime<Utc>,
    pub metrics: Metrics,
    pub schema: FeatureSchema,
    pub pipeline_crc32: u32,
}

/// A fully-loaded published bundle: the composed pipeline, the standalone
/// scaler extracted from it, and the recorded metadata.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub pipeline: FittedPipeline,
    pub scaler: StandardScaler,
    pub metadata: ArtifactMetadata,
}

impl Artifact {
    pub fn version(&self) -> ModelVersion {
        self.metadata.version
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.pipeline.schema
    }
}

/// Durable owner of artifact bytes and the current-version pointer.
/// Single writer (the training orchestrator); any number of readers.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join(VERSIONS_DIR))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn versions_dir(&self) -> PathBuf {
        self.root.join(VERSIONS_DIR)
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILE)
    }

    fn version_dir(&self, version: ModelVersion) -> PathBuf {
        self.versions_dir().join(version.dirname())
    }

    /// Publish `pipeline` under a fresh version and advance the pointer.
    ///
    /// All component files land in an unreferenced staging directory first;
    /// the staging directory is renamed into place, and only then is
    /// `CURRENT` swapped (itself temp-write + rename). A failure anywhere
    /// before the final swap leaves the previous pointer intact. Published
    /// version directories are never rewritten.
    pub fn publish(&self, pipeline: &FittedPipeline, metrics: &Metrics) -> Result<ModelVersion> {
        let version = self.next_version()?;
        let final_dir = self.version_dir(version);
        if final_dir.exists() {
            return Err(Error::Corrupted(format!(
                "version directory already exists: {}",
                final_dir.display()
            )));
        }

        let staging = self
            .versions_dir()
            .join(format!(".staging-{}", version.dirname()));
        if staging.exists() {
            // leftover of a publish that died before its rename
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let pipeline_bytes = encode(pipeline)?;
        let scaler_bytes = encode(&pipeline.scaler)?;
        let metadata = ArtifactMetadata {
            version,
            created_at: Utc::now(),
            metrics: *metrics,
            schema: pipeline.schema.clone(),
            pipeline_crc32: crc32fast::hash(&pipeline_bytes),
        };
        let metadata_bytes =
            serde_json::to_vec_pretty(&metadata).map_err(|e| Error::Serialization(e.to_string()))?;

        write_file_synced(&staging.join(PIPELINE_FILE), &pipeline_bytes)?;
        write_file_synced(&staging.join(SCALER_FILE), &scaler_bytes)?;
        write_file_synced(&staging.join(METADATA_FILE), &metadata_bytes)?;

        fs::rename(&staging, &final_dir)?;
        self.swap_current(version)?;

        info!(version = %version, "published model artifact");
        Ok(version)
    }

    /// The published version the pointer names, or `None` before the first
    /// successful publish.
    pub fn current_version(&self) -> Result<Option<ModelVersion>> {
        let raw = match fs::read_to_string(self.current_path()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let id: u64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::Corrupted(format!("unparsable version pointer: {raw:?}")))?;
        Ok(Some(ModelVersion(id)))
    }

    /// Load one published version, verifying the recorded checksum.
    pub fn load(&self, version: ModelVersion) -> Result<Artifact> {
        let dir = self.version_dir(version);
        if !dir.is_dir() {
            return Err(Error::ArtifactNotFound(version));
        }

        let metadata_bytes = fs::read(dir.join(METADATA_FILE))
            .map_err(|e| Error::Corrupted(format!("version {version} metadata unreadable: {e}")))?;
        let metadata: ArtifactMetadata = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| Error::Corrupted(format!("version {version} metadata invalid: {e}")))?;

        let pipeline_bytes = fs::read(dir.join(PIPELINE_FILE))
            .map_err(|e| Error::Corrupted(format!("version {version} pipeline unreadable: {e}")))?;
        if crc32fast::hash(&pipeline_bytes) != metadata.pipeline_crc32 {
            return Err(Error::Corrupted(format!(
                "checksum mismatch for version {version}"
            )));
        }
        let pipeline: FittedPipeline = decode(&pipeline_bytes)?;

        let scaler_bytes = fs::read(dir.join(SCALER_FILE))
            .map_err(|e| Error::Corrupted(format!("version {version} scaler unreadable: {e}")))?;
        let scaler: StandardScaler = decode(&scaler_bytes)?;

        debug!(version = %version, "loaded artifact");
        Ok(Artifact {
            pipeline,
            scaler,
            metadata,
        })
    }

    /// Next unused version id: one past the max of the pointer and every
    /// existing version directory, so an id is never reused even when the
    /// pointer lags a completed rename.
    fn next_version(&self) -> Result<ModelVersion> {
        let mut max = self.current_version()?.map(|v| v.0).unwrap_or(0);
        for entry in fs::read_dir(self.versions_dir())? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(id) = name
                .to_string_lossy()
                .strip_prefix('v')
                .and_then(|s| s.parse::<u64>().ok())
            {
                max = max.max(id);
            }
        }
        Ok(ModelVersion(max + 1))
    }

    fn swap_current(&self, version: ModelVersion) -> Result<()> {
        let tmp = self.root.join(".CURRENT.tmp");
        write_file_synced(&tmp, format!("{}\n", version.0).as_bytes())?;
        fs::rename(&tmp, self.current_path())?;
        Ok(())
    }
}

fn write_file_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>> {
    bincode::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| Error::Serialization(e.to_string()))
}

fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(value)
}
