//! Raw snapshot: `date,rate` CSV plus a JSON provenance sidecar.

use crate::application::cleaning::coerce_observation;
use crate::domain::errors::{StoreError, ValidationError};
use crate::domain::fx::{ISO_DATE_FORMAT, RAW_COLUMNS, RateSeries, RateSnapshot, SnapshotMetadata};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Who served the snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSource {
    pub source_name: String,
    pub endpoint: String,
    pub soap_action: String,
}

/// `usd_gtq_daily.csv` -> `usd_gtq_daily.metadata.json`, same directory.
pub fn metadata_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.metadata.json"))
}

/// Writes the snapshot CSV and its sidecar. Returns the sidecar content.
pub fn save_raw_snapshot(
    snapshot: &RateSnapshot,
    source: &SnapshotSource,
    path: &Path,
) -> Result<SnapshotMetadata, StoreError> {
    let series = &snapshot.series;
    if series.is_empty() {
        return Err(ValidationError::Empty { table: "FX" }.into());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    write_csv(series, path)?;

    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    let metadata = SnapshotMetadata {
        source_name: source.source_name.clone(),
        source_endpoint: source.endpoint.clone(),
        soap_action: source.soap_action.clone(),
        retrieved_at_utc: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        requested_start_date: snapshot.requested_start.clone(),
        requested_end_date: snapshot.requested_end.clone(),
        row_count: series.len(),
        min_date: format_date(series.min_date()),
        max_date: format_date(series.max_date()),
        schema: RAW_COLUMNS.iter().map(|c| c.to_string()).collect(),
        sha256: hex::encode(Sha256::digest(&bytes)),
    };
    write_metadata(&metadata, &metadata_path_for(path))?;

    info!(
        "Saved raw snapshot {:?}: {} rows, {} to {}",
        path, metadata.row_count, metadata.min_date, metadata.max_date
    );
    Ok(metadata)
}

/// Reads a snapshot under the strict `date,rate` schema.
///
/// Header must match exactly. Every cell must coerce; the result is sorted
/// with one row per date (last wins).
pub fn load_raw(path: &Path) -> Result<RateSeries, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound {
            kind: "Raw data",
            path: path.to_path_buf(),
            expected: RAW_COLUMNS.join(", "),
        });
    }

    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_strict_header(&headers)?;

    let mut observations = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let raw_date = record.get(0).unwrap_or("").trim();
        let raw_rate = record.get(1).unwrap_or("").trim();

        observations.push(coerce_observation(row_idx, raw_date, raw_rate)?);
    }

    Ok(RateSeries::normalized(observations))
}

/// Reads the provenance sidecar of a snapshot.
pub fn load_metadata(csv_path: &Path) -> Result<SnapshotMetadata, StoreError> {
    let path = metadata_path_for(csv_path);
    let content = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json { path, source })
}

/// Recomputes the snapshot checksum and compares it to the sidecar.
pub fn verify_checksum(csv_path: &Path) -> Result<bool, StoreError> {
    let metadata = load_metadata(csv_path)?;
    let bytes = fs::read(csv_path).map_err(|e| StoreError::io(csv_path, e))?;
    Ok(hex::encode(Sha256::digest(&bytes)) == metadata.sha256)
}

pub(crate) fn check_strict_header(headers: &[String]) -> Result<(), ValidationError> {
    if headers.iter().map(String::as_str).eq(RAW_COLUMNS.iter().copied()) {
        return Ok(());
    }
    let missing: Vec<&str> = RAW_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == c))
        .collect();
    if missing.is_empty() {
        Err(ValidationError::ColumnMismatch {
            expected: RAW_COLUMNS.join(", "),
            found: headers.join(", "),
        })
    } else {
        Err(ValidationError::MissingColumns {
            missing: missing.join(", "),
        })
    }
}

fn write_csv(series: &RateSeries, path: &Path) -> Result<(), StoreError> {
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(RAW_COLUMNS).map_err(csv_err)?;
    for obs in series.observations() {
        let date = obs.date.format(ISO_DATE_FORMAT).to_string();
        writer
            .write_record([date, obs.rate.to_string()])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))
}

/// Pretty JSON with sorted keys and a trailing newline.
pub(crate) fn write_sorted_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<(), StoreError> {
    let json_err = |source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    };
    let value = sort_keys(serde_json::to_value(value).map_err(json_err)?);
    let mut content = serde_json::to_string_pretty(&value).map_err(json_err)?;
    content.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| StoreError::io(path, e))
}

/// Rebuilds every object with its keys in ascending order.
fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn write_metadata(metadata: &SnapshotMetadata, path: &Path) -> Result<(), StoreError> {
    write_sorted_json(metadata, path)
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format(ISO_DATE_FORMAT).to_string())
        .unwrap_or_default()
}
