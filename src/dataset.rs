//! Dataset loading.
//!
//! Reads the flat training CSV into memory, selecting the feature and
//! target columns named by the schema. No caching: training is infrequent
//! and staleness is unacceptable, so every run reads fresh.

use crate::error::{Error, Result};
use crate::schema::FeatureSchema;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// In-memory training table: one row per house, features in schema order.
#[derive(Debug, Clone)]
pub struct DataTable {
    pub schema: FeatureSchema,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone)]
pub struct TableRow {
    pub features: Vec<f64>,
    pub target: f64,
}

impl DataTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load the dataset at `path`, schema-checked.
///
/// Fails with `DatasetNotFound` if the file is missing, `Schema` if a
/// required column is absent, a required cell does not parse as a number,
/// or there are too few rows to split.
pub fn load(path: &Path, schema: &FeatureSchema) -> Result<DataTable> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::DatasetNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| Error::Schema(format!("unreadable header row: {e}")))?
        .clone();

    let find_column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::Schema(format!("missing required column `{name}`")))
    };
    let feature_indices: Vec<usize> = schema
        .features
        .iter()
        .map(|name| find_column(name))
        .collect::<Result<_>>()?;
    let target_index = find_column(&schema.target)?;

    let parse_cell = |record: &csv::StringRecord, idx: usize, name: &str, line: usize| {
        let cell = record.get(idx).unwrap_or("");
        let value: f64 = cell.parse().map_err(|_| {
            Error::Schema(format!(
                "row {}, column `{name}`: `{cell}` is not numeric",
                line + 2
            ))
        })?;
        if !value.is_finite() {
            return Err(Error::Schema(format!(
                "row {}, column `{name}`: non-finite value",
                line + 2
            )));
        }
        Ok(value)
    };

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::Schema(format!("row {}: {e}", line + 2)))?;
        let features = feature_indices
            .iter()
            .zip(&schema.features)
            .map(|(&idx, name)| parse_cell(&record, idx, name, line))
            .collect::<Result<Vec<f64>>>()?;
        let target = parse_cell(&record, target_index, &schema.target, line)?;
        rows.push(TableRow { features, target });
    }

    if rows.len() < 2 {
        return Err(Error::Schema(format!(
            "dataset has {} usable rows; at least 2 are required to split",
            rows.len()
        )));
    }

    Ok(DataTable {
        schema: schema.clone(),
        rows,
    })
}
