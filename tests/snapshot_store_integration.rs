mod common;

use common::TestDir;
use fxvar::application::features::build_features;
use fxvar::domain::errors::{StoreError, ValidationError};
use fxvar::domain::fx::{RateSeries, RateSnapshot};
use fxvar::infrastructure::persistence::{
    SnapshotSource, load_feature_frame, load_metadata, load_processed, load_raw,
    metadata_path_for, save_feature_frame, save_processed, save_raw_snapshot, verify_checksum,
};
use sha2::{Digest, Sha256};
use std::fs;

fn source() -> SnapshotSource {
    SnapshotSource {
        source_name: "Banco de Guatemala (Banguat) TipoCambio SOAP".to_string(),
        endpoint: common::FAKE_ENDPOINT.to_string(),
        soap_action: "http://www.banguat.gob.gt/variables/ws/TipoCambioRango".to_string(),
    }
}

fn snapshot(n: usize) -> RateSnapshot {
    RateSnapshot {
        series: RateSeries::normalized(common::synthetic_series(n)),
        requested_start: "1900-01-01".to_string(),
        requested_end: "2026-02-22".to_string(),
    }
}

#[test]
fn test_raw_snapshot_roundtrip_with_sidecar() {
    let dir = TestDir::new("snapshot_sidecar");
    let path = dir.path().join("data/raw/usd_gtq_daily.csv");
    let snapshot = snapshot(90);

    save_raw_snapshot(&snapshot, &source(), &path).unwrap();
    let loaded = load_raw(&path).unwrap();
    assert_eq!(loaded, snapshot.series);

    let sidecar = metadata_path_for(&path);
    assert_eq!(sidecar, dir.path().join("data/raw/usd_gtq_daily.metadata.json"));

    let metadata = load_metadata(&path).unwrap();
    assert_eq!(metadata.row_count, 90);
    assert_eq!(metadata.min_date, "2024-01-01");
    assert_eq!(metadata.max_date, "2024-03-30");
    assert_eq!(metadata.requested_start_date, "1900-01-01");
    assert_eq!(metadata.requested_end_date, "2026-02-22");
    assert_eq!(metadata.schema, vec!["date", "rate"]);
    assert_eq!(metadata.source_endpoint, common::FAKE_ENDPOINT);
    assert!(metadata.retrieved_at_utc.ends_with('Z'));
    assert_eq!(metadata.retrieved_at_utc.len(), "2026-02-22T10:00:00Z".len());

    let bytes = fs::read(&path).unwrap();
    assert_eq!(metadata.sha256, hex::encode(Sha256::digest(&bytes)));
    assert!(verify_checksum(&path).unwrap());

    let raw_json = fs::read_to_string(&sidecar).unwrap();
    assert!(raw_json.ends_with('\n'));
    let first_key = raw_json.lines().nth(1).unwrap().trim();
    assert!(first_key.starts_with("\"max_date\""));
}

#[test]
fn test_snapshot_is_superseded_not_merged() {
    let dir = TestDir::new("snapshot_supersede");
    let path = dir.path().join("usd_gtq_daily.csv");

    save_raw_snapshot(&snapshot(50), &source(), &path).unwrap();
    save_raw_snapshot(&snapshot(20), &source(), &path).unwrap();

    assert_eq!(load_raw(&path).unwrap().len(), 20);
    assert_eq!(load_metadata(&path).unwrap().row_count, 20);
}

#[test]
fn test_load_raw_missing_file_names_path_and_schema() {
    let dir = TestDir::new("snapshot_missing");
    let path = dir.path().join("usd_gtq_daily.csv");
    let err = load_raw(&path).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(msg.contains("usd_gtq_daily.csv"));
    assert!(msg.contains("date, rate"));
}

#[test]
fn test_load_raw_rejects_bad_cells() {
    let dir = TestDir::new("snapshot_bad_cells");
    let path = dir.path().join("bad.csv");
    fs::write(&path, "date,rate\n2024-01-01,7.8\n2024-01-02,n/a\n").unwrap();
    assert!(matches!(
        load_raw(&path),
        Err(StoreError::Validation(ValidationError::InvalidType { row: 1, .. }))
    ));
}

#[test]
fn test_processed_and_feature_tables_roundtrip() {
    let dir = TestDir::new("tables_roundtrip");
    let processed = dir.path().join("processed/fx_rates.parquet");
    let features = dir.path().join("processed/features.parquet");
    let series = snapshot(150).series;

    save_processed(&series, &processed).unwrap();
    let reloaded = load_processed(&processed).unwrap();
    assert_eq!(reloaded, series);

    let table = build_features(reloaded.observations(), 10_000.0, &[1, 5, 10, 20, 60]).unwrap();
    save_feature_frame(&table, &features).unwrap();
    let stored = load_feature_frame(&features).unwrap();
    assert_eq!(stored, table);
    assert_eq!(stored.lags(), &[1, 5, 10, 20, 60]);
}
