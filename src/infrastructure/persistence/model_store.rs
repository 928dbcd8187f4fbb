//! JSON files for fitted models and evaluation reports.

use super::raw_snapshot::write_sorted_json;
use crate::domain::errors::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub fn save_model<M: Serialize>(model: &M, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, model).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    info!("Saved model to {:?}", path);
    Ok(())
}

pub fn load_model<M: DeserializeOwned>(path: &Path) -> Result<M, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound {
            kind: "Model",
            path: path.to_path_buf(),
            expected: "serialized model JSON".to_string(),
        });
    }
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Deterministic report JSON: sorted keys, two-space indent, trailing newline.
pub fn save_metrics<T: Serialize>(metrics: &T, path: &Path) -> Result<(), StoreError> {
    write_sorted_json(metrics, path)?;
    info!("Saved metrics to {:?}", path);
    Ok(())
}
