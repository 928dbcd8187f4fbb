mod common;

use chrono::Datelike;
use common::{FakeTransport, TestDir, rates_response, synthetic_series, wire_date};
use fxvar::application::acquisition::{RateDownloader, RetryPolicy};
use fxvar::application::ml::{LinearMeanModel, QuantileForestModel};
use fxvar::application::pipeline::{run_feature_stage, run_model_stage, run_snapshot_stage};
use fxvar::config::{FeatureEnvConfig, ModelEnvConfig, PathsConfig, SoapSchema};
use fxvar::domain::errors::TransportFailure;
use fxvar::domain::ports::RegressionModel;
use fxvar::infrastructure::observability::PipelineMetrics;
use fxvar::infrastructure::persistence::{load_feature_frame, load_model};
use std::fs;
use std::time::Duration;

/// 700 daily rows split into the 2024 and 2025 chunk responses
fn two_year_responses() -> Vec<Result<Vec<u8>, TransportFailure>> {
    let series = synthetic_series(700);
    let (y2024, y2025): (Vec<_>, Vec<_>) = series.iter().partition(|o| o.date.year() == 2024);
    let wire = |rows: Vec<&fxvar::domain::fx::RateObservation>| {
        rates_response(
            &rows
                .iter()
                .map(|o| (wire_date(o.date), o.rate))
                .collect::<Vec<_>>(),
        )
    };
    vec![Ok(wire(y2024)), Ok(wire(y2025))]
}

fn downloader(responses: Vec<Result<Vec<u8>, TransportFailure>>) -> RateDownloader<FakeTransport> {
    RateDownloader::new(
        FakeTransport::new(responses),
        SoapSchema::default(),
        RetryPolicy::new(2, Duration::ZERO, Duration::ZERO),
    )
}

#[tokio::test]
async fn test_all_stages_write_their_artifacts() {
    let dir = TestDir::new("pipeline_all");
    let paths = PathsConfig::rooted_at(dir.path());
    let features = FeatureEnvConfig::default();
    let model = ModelEnvConfig {
        n_trees: 10,
        max_depth: 4,
        ..ModelEnvConfig::default()
    };
    let metrics = PipelineMetrics::new().unwrap();

    let dl = downloader(two_year_responses()).with_metrics(metrics.clone());
    let snapshot = run_snapshot_stage(&dl, &paths, "2024-01-01", "2025-12-31")
        .await
        .unwrap();
    assert_eq!(snapshot.rows, 700);
    assert_eq!(dl.transport().request_count(), 2);
    let line = snapshot.status_line();
    assert!(line.starts_with("STAGE2_SNAPSHOT rows=700 min_date=2024-01-01"));
    assert!(line.contains("raw_file=usd_gtq_daily.csv"));
    assert!(line.contains("processed_file=fx_rates.parquet"));
    assert!(paths.raw_file().exists());
    assert!(dir.path().join("data/raw/usd_gtq_daily.metadata.json").exists());
    assert!(paths.processed_file().exists());

    let feature_summary = run_feature_stage(&paths, &features, Some(&metrics)).unwrap();
    assert_eq!(feature_summary.rows, 638);
    assert!(feature_summary.status_line().starts_with("STAGE3_FEATURES rows=638"));
    assert_eq!(load_feature_frame(&paths.features_file()).unwrap().len(), 638);
    assert!(metrics.render().contains("fxvar_feature_rows 638"));
    assert!(metrics.render().contains("fxvar_rows_decoded_total 700"));

    let report = run_model_stage(&paths, &features, &model).unwrap();
    assert_eq!(report.test_rows, 250);
    assert_eq!(report.train_rows, 388);
    assert!(report.train_end < report.test_start);
    assert!(report.status_line().starts_with("STAGE4_MODELS"));
    assert!((0.0..=1.0).contains(&report.quantile_linear.breach_rate));
    assert!(report.linear_mean.rmse.is_finite());

    let metrics_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(paths.metrics_file()).unwrap()).unwrap();
    assert_eq!(metrics_json["test_rows"], 250);
    assert_eq!(metrics_json["target"], "pnl_next_day");

    let mean: LinearMeanModel =
        load_model(&paths.models_dir().join("linear_mean.json")).unwrap();
    let forest: QuantileForestModel =
        load_model(&paths.models_dir().join("quantile_forest.json")).unwrap();
    let table = load_feature_frame(&paths.features_file()).unwrap();
    let row: Vec<f64> = {
        let mut values = table.rows()[0].numeric_values();
        values.remove(4); // pnl_next_day
        values
    };
    assert_eq!(mean.predict(&[row.clone()]).unwrap().len(), 1);
    assert!(forest.predict(&[row]).unwrap()[0].is_finite());
}

#[tokio::test]
async fn test_snapshot_stage_failure_carries_hint() {
    let dir = TestDir::new("pipeline_fail");
    let paths = PathsConfig::rooted_at(dir.path());
    let dl = downloader(vec![
        Err(TransportFailure::Network("dns".into())),
        Err(TransportFailure::Network("dns".into())),
    ]);

    let err = run_snapshot_stage(&dl, &paths, "2024-01-01", "2024-03-01")
        .await
        .unwrap_err();

    let chain = format!("{:#}", err);
    assert!(chain.contains("Stage 2 pipeline failed"));
    assert!(chain.contains("network access"));
    assert!(chain.contains("attempts=2"));
    assert!(!paths.raw_file().exists());
}

#[test]
fn test_model_stage_without_features_is_not_found() {
    let dir = TestDir::new("pipeline_no_features");
    let paths = PathsConfig::rooted_at(dir.path());
    let err = run_model_stage(&paths, &FeatureEnvConfig::default(), &ModelEnvConfig::default())
        .unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("Stage 4"));
    assert!(chain.contains("features.parquet"));
}
