//! File stores: raw CSV snapshots, Parquet tables, model and report JSON.

pub mod model_store;
pub mod parquet_store;
pub mod raw_snapshot;

pub use model_store::{load_model, save_metrics, save_model};
pub use parquet_store::{load_feature_frame, load_processed, save_feature_frame, save_processed};
pub use raw_snapshot::{
    SnapshotSource, load_metadata, load_raw, metadata_path_for, save_raw_snapshot,
    verify_checksum,
};
