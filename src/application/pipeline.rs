//! Stage orchestration.
//!
//! Each stage reads its inputs from disk, writes its outputs, and reloads
//! them to confirm the stored schema. Failures are wrapped with a hint
//! naming the usual causes.

use crate::application::acquisition::RateDownloader;
use crate::application::cleaning::validate_series;
use crate::application::evaluation::{MeanForecastMetrics, QuantileForecastMetrics};
use crate::application::features::{build_features, train_test_split_time};
use crate::application::ml::{LinearMeanModel, QuantileForestModel, QuantileLinearModel};
use crate::config::{FeatureEnvConfig, ModelEnvConfig, PathsConfig};
use crate::domain::features::TARGET_COLUMN;
use crate::domain::ports::{RegressionModel, SoapTransport};
use crate::infrastructure::observability::PipelineMetrics;
use crate::infrastructure::persistence::{
    SnapshotSource, load_feature_frame, load_processed, load_raw, save_feature_frame,
    save_metrics, save_model, save_processed, save_raw_snapshot,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const SNAPSHOT_HINT: &str = "Stage 2 pipeline failed during data acquisition/snapshotting. \
     Check network access to Banguat, strict schema (date, rate), and file permissions.";
const FEATURE_HINT: &str = "Stage 3 pipeline failed during feature construction. \
     Check that the raw snapshot exists with strict schema (date, rate), enough history \
     for the configured lags, and file permissions.";
const MODEL_HINT: &str = "Stage 4 pipeline failed during model training/evaluation. \
     Check that the feature table exists, has more rows than TEST_DAYS, and that the \
     reports directory is writable.";

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn iso(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub rows: usize,
    pub min_date: String,
    pub max_date: String,
    pub requested_start: String,
    pub requested_end: String,
    pub raw_file: PathBuf,
    pub processed_file: PathBuf,
}

impl SnapshotSummary {
    pub fn status_line(&self) -> String {
        format!(
            "STAGE2_SNAPSHOT rows={} min_date={} max_date={} requested_start={} requested_end={} raw_file={} processed_file={}",
            self.rows,
            self.min_date,
            self.max_date,
            self.requested_start,
            self.requested_end,
            file_name(&self.raw_file),
            file_name(&self.processed_file)
        )
    }
}

/// Stage 2: download, snapshot, reload, store the processed table.
///
/// Always downloads; there is no cache.
pub async fn run_snapshot_stage<T: SoapTransport>(
    downloader: &RateDownloader<T>,
    paths: &PathsConfig,
    start: &str,
    end: &str,
) -> Result<SnapshotSummary> {
    snapshot_stage(downloader, paths, start, end)
        .await
        .context(SNAPSHOT_HINT)
}

async fn snapshot_stage<T: SoapTransport>(
    downloader: &RateDownloader<T>,
    paths: &PathsConfig,
    start: &str,
    end: &str,
) -> Result<SnapshotSummary> {
    paths.ensure_directories()?;

    let snapshot = downloader.download(start, end).await?;
    let source = SnapshotSource {
        source_name: downloader.schema().source_name.clone(),
        endpoint: downloader.endpoint().to_string(),
        soap_action: downloader.schema().soap_action.clone(),
    };

    let raw_file = paths.raw_file();
    save_raw_snapshot(&snapshot, &source, &raw_file)?;
    let raw = load_raw(&raw_file)?;
    validate_series(&raw)?;

    let processed_file = paths.processed_file();
    save_processed(&raw, &processed_file)?;
    let processed = load_processed(&processed_file)?;

    Ok(SnapshotSummary {
        rows: processed.len(),
        min_date: iso(processed.min_date()),
        max_date: iso(processed.max_date()),
        requested_start: snapshot.requested_start,
        requested_end: snapshot.requested_end,
        raw_file,
        processed_file,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSummary {
    pub rows: usize,
    pub columns: usize,
    pub lags: Vec<usize>,
    pub min_date: String,
    pub max_date: String,
    pub feature_file: PathBuf,
}

impl FeatureSummary {
    pub fn status_line(&self) -> String {
        let lags: Vec<String> = self.lags.iter().map(|l| l.to_string()).collect();
        format!(
            "STAGE3_FEATURES rows={} columns={} lags={} min_date={} max_date={} feature_file={}",
            self.rows,
            self.columns,
            lags.join(","),
            self.min_date,
            self.max_date,
            file_name(&self.feature_file)
        )
    }
}

/// Stage 3: raw snapshot to stored feature table.
pub fn run_feature_stage(
    paths: &PathsConfig,
    features: &FeatureEnvConfig,
    metrics: Option<&PipelineMetrics>,
) -> Result<FeatureSummary> {
    feature_stage(paths, features, metrics).context(FEATURE_HINT)
}

fn feature_stage(
    paths: &PathsConfig,
    features: &FeatureEnvConfig,
    metrics: Option<&PipelineMetrics>,
) -> Result<FeatureSummary> {
    let raw = load_raw(&paths.raw_file())?;
    let table = build_features(raw.observations(), features.notional, &features.lags)?;

    let feature_file = paths.features_file();
    save_feature_frame(&table, &feature_file)?;
    let stored = load_feature_frame(&feature_file)?;

    if let Some(metrics) = metrics {
        metrics.feature_rows.set(stored.len() as f64);
    }
    info!(
        "Feature table: {} rows from {} observations",
        stored.len(),
        raw.len()
    );

    Ok(FeatureSummary {
        rows: stored.len(),
        columns: stored.columns().len(),
        lags: stored.lags().to_vec(),
        min_date: iso(stored.min_date()),
        max_date: iso(stored.max_date()),
        feature_file,
    })
}

/// Persisted evaluation report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub target: String,
    pub features: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_start: String,
    pub train_end: String,
    pub test_start: String,
    pub test_end: String,
    pub linear_mean: MeanForecastMetrics,
    pub quantile_linear: QuantileForecastMetrics,
    pub quantile_forest: QuantileForecastMetrics,
}

impl EvaluationReport {
    pub fn status_line(&self) -> String {
        format!(
            "STAGE4_MODELS train_rows={} test_rows={} mae={:.4} rmse={:.4} q={} breach_rate_linear={:.4} breach_rate_forest={:.4}",
            self.train_rows,
            self.test_rows,
            self.linear_mean.mae,
            self.linear_mean.rmse,
            self.quantile_linear.quantile_level,
            self.quantile_linear.breach_rate,
            self.quantile_forest.breach_rate
        )
    }
}

/// Stage 4: split, fit, predict the test window, write models and metrics.
pub fn run_model_stage(
    paths: &PathsConfig,
    features: &FeatureEnvConfig,
    model: &ModelEnvConfig,
) -> Result<EvaluationReport> {
    model_stage(paths, features, model).context(MODEL_HINT)
}

fn model_stage(
    paths: &PathsConfig,
    features: &FeatureEnvConfig,
    model: &ModelEnvConfig,
) -> Result<EvaluationReport> {
    let table = load_feature_frame(&paths.features_file())?;
    let split = train_test_split_time(&table, features.test_days, TARGET_COLUMN)?;
    let (x_train, x_test) = (&split.x_train.values, &split.x_test.values);

    let mut linear_mean = LinearMeanModel::new();
    let mut quantile_linear = QuantileLinearModel::new(model.quantile_level)?;
    let mut quantile_forest = QuantileForestModel::from_config(model)?;

    let predictions = {
        let models: [&mut dyn RegressionModel; 3] =
            [&mut linear_mean, &mut quantile_linear, &mut quantile_forest];
        let mut predictions = Vec::with_capacity(models.len());
        for m in models {
            m.fit(x_train, &split.y_train)?;
            let predicted = m.predict(x_test)?;
            info!("{}: fitted on {} rows, predicted {}", m.name(), x_train.len(), predicted.len());
            predictions.push(predicted);
        }
        predictions
    };

    let models_dir = paths.models_dir();
    save_model(&linear_mean, &models_dir.join(format!("{}.json", LinearMeanModel::NAME)))?;
    save_model(
        &quantile_linear,
        &models_dir.join(format!("{}.json", QuantileLinearModel::NAME)),
    )?;
    save_model(
        &quantile_forest,
        &models_dir.join(format!("{}.json", QuantileForestModel::NAME)),
    )?;

    let y_test = &split.y_test;
    let level = model.quantile_level;
    let report = EvaluationReport {
        target: TARGET_COLUMN.to_string(),
        features: split.x_train.columns.clone(),
        train_rows: split.x_train.len(),
        test_rows: split.x_test.len(),
        train_start: iso(split.x_train.min_date()),
        train_end: iso(split.x_train.max_date()),
        test_start: iso(split.x_test.min_date()),
        test_end: iso(split.x_test.max_date()),
        linear_mean: MeanForecastMetrics::evaluate(y_test, &predictions[0]),
        quantile_linear: QuantileForecastMetrics::evaluate(y_test, &predictions[1], level),
        quantile_forest: QuantileForecastMetrics::evaluate(y_test, &predictions[2], level),
    };
    save_metrics(&report, &paths.metrics_file())?;

    Ok(report)
}
