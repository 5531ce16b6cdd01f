//! Append-only audit records.
//!
//! One JSON line per record, appended after the core operation succeeds.
//! Records are never mutated or rewritten; the newest training run backs
//! the status query external layers expose.

use crate::error::{Error, Result};
use crate::store::ModelVersion;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TRAINING_RUNS_FILE: &str = "training_runs.jsonl";
const PREDICTIONS_FILE: &str = "predictions.jsonl";

/// One completed training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRun {
    pub created_at: DateTime<Utc>,
    pub dataset_rows: usize,
    pub r2_score: f64,
    pub mae: f64,
    pub version: ModelVersion,
}

/// One served prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionLog {
    pub created_at: DateTime<Utc>,
    pub input: serde_json::Value,
    pub predicted_price: f64,
}

pub struct AuditLog {
    root: PathBuf,
}

impl AuditLog {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn append_training_run(&self, run: &TrainingRun) -> Result<()> {
        append_jsonl(&self.root.join(TRAINING_RUNS_FILE), run)
    }

    pub fn append_prediction(&self, record: &PredictionLog) -> Result<()> {
        append_jsonl(&self.root.join(PREDICTIONS_FILE), record)
    }

    /// The most recent training run, or `None` before the first one.
    pub fn latest_training_run(&self) -> Result<Option<TrainingRun>> {
        Ok(self.training_runs()?.pop())
    }

    /// All training runs, oldest first.
    pub fn training_runs(&self) -> Result<Vec<TrainingRun>> {
        read_jsonl(&self.root.join(TRAINING_RUNS_FILE))
    }

    /// All served predictions, oldest first.
    pub fn predictions(&self) -> Result<Vec<PredictionLog>> {
        read_jsonl(&self.root.join(PREDICTIONS_FILE))
    }
}

fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut line =
        serde_json::to_string(record).map_err(|e| Error::Serialization(e.to_string()))?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| Error::Serialization(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn run(rows: usize, version: u64) -> TrainingRun {
        TrainingRun {
            created_at: Utc::now(),
            dataset_rows: rows,
            r2_score: 0.9,
            mae: 1000.0,
            version: ModelVersion(version),
        }
    }

    #[test]
    fn empty_log_has_no_latest_run() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(dir.path()).unwrap();
        assert!(log.latest_training_run().unwrap().is_none());
    }

    #[test]
    fn appends_accumulate_and_latest_is_newest() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(dir.path()).unwrap();
        log.append_training_run(&run(10, 1)).unwrap();
        log.append_training_run(&run(12, 2)).unwrap();

        let runs = log.training_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].version, ModelVersion(1));

        let latest = log.latest_training_run().unwrap().unwrap();
        assert_eq!(latest.version, ModelVersion(2));
        assert_eq!(latest.dataset_rows, 12);
    }

    #[test]
    fn prior_lines_survive_later_appends() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(dir.path()).unwrap();
        log.append_training_run(&run(10, 1)).unwrap();
        let before = fs::read_to_string(dir.path().join(TRAINING_RUNS_FILE)).unwrap();
        log.append_training_run(&run(11, 2)).unwrap();
        let after = fs::read_to_string(dir.path().join(TRAINING_RUNS_FILE)).unwrap();
        assert!(after.starts_with(&before));
    }

    #[test]
    fn predictions_round_trip() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(dir.path()).unwrap();
        log.append_prediction(&PredictionLog {
            created_at: Utc::now(),
            input: json!({"size": 1200, "bedrooms": 2, "age": 8}),
            predicted_price: 251_300.25,
        })
        .unwrap();
        let records = log.predictions().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].predicted_price, 251_300.25);
        assert_eq!(records[0].input["bedrooms"], 2);
    }
}
