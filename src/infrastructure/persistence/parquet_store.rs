//! Columnar stores for the processed rate table and the feature table.

use crate::domain::errors::{StoreError, ValidationError};
use crate::domain::features::{
    FeatureRow, FeatureTable, LagFeatures, TARGET_COLUMN, feature_columns,
};
use crate::domain::fx::{RAW_COLUMNS, RateObservation, RateSeries};
use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, Int8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const LAG_PREFIX: &str = "return_simple_lag_";

/// Date32 counts days from 1970-01-01, which is also `NaiveDate::default()`.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn to_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(epoch()).num_days() as i32
}

fn from_days(days: i32) -> Option<NaiveDate> {
    if days >= 0 {
        epoch().checked_add_days(Days::new(days as u64))
    } else {
        epoch().checked_sub_days(Days::new(days.unsigned_abs() as u64))
    }
}

/// Writes the cleaned `date,rate` table.
pub fn save_processed(series: &RateSeries, path: &Path) -> Result<(), StoreError> {
    if series.is_empty() {
        return Err(ValidationError::Empty { table: "FX" }.into());
    }
    let schema = Schema::new(vec![
        Field::new("date", DataType::Date32, false),
        Field::new("rate", DataType::Float64, false),
    ]);

    let obs = series.observations();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(
            obs.iter().map(|o| to_days(o.date)).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            obs.iter().map(|o| o.rate).collect::<Vec<_>>(),
        )),
    ];
    write_parquet(path, schema, columns)?;
    info!("Saved processed table {:?}: {} rows", path, series.len());
    Ok(())
}

/// Reads the processed table back under the strict `date,rate` schema.
pub fn load_processed(path: &Path) -> Result<RateSeries, StoreError> {
    let batches = read_parquet(path, "Processed data", &RAW_COLUMNS.join(", "))?;
    let mut observations = Vec::new();

    for batch in &batches {
        let names = column_names(batch);
        if names.len() != RAW_COLUMNS.len() || names.iter().zip(RAW_COLUMNS).any(|(a, b)| a != b) {
            let missing: Vec<&str> = RAW_COLUMNS
                .iter()
                .copied()
                .filter(|c| !names.iter().any(|n| n == c))
                .collect();
            return Err(if missing.is_empty() {
                ValidationError::ColumnMismatch {
                    expected: RAW_COLUMNS.join(", "),
                    found: names.join(", "),
                }
            } else {
                ValidationError::MissingColumns {
                    missing: missing.join(", "),
                }
            }
            .into());
        }

        let dates = date_column(batch, path)?;
        let rates = f64_column(batch, "rate", path)?;
        for i in 0..batch.num_rows() {
            let date = read_date(dates, i, observations.len())?;
            let rate = read_f64(rates, "rate", i, observations.len())?;
            observations.push(RateObservation::new(date, rate));
        }
    }

    Ok(RateSeries::normalized(observations))
}

/// Writes every feature column, `date` first.
pub fn save_feature_frame(table: &FeatureTable, path: &Path) -> Result<(), StoreError> {
    let columns = table.columns();
    let fields: Vec<Field> = columns
        .iter()
        .map(|name| match name.as_str() {
            "date" => Field::new(name, DataType::Date32, false),
            "is_weekend" => Field::new(name, DataType::Int8, false),
            _ => Field::new(name, DataType::Float64, false),
        })
        .collect();

    let rows = table.rows();
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    arrays.push(Arc::new(Date32Array::from(
        rows.iter().map(|r| to_days(r.date)).collect::<Vec<_>>(),
    )));

    let values: Vec<Vec<f64>> = rows.iter().map(FeatureRow::numeric_values).collect();
    for (idx, name) in columns.iter().skip(1).enumerate() {
        if name == "is_weekend" {
            arrays.push(Arc::new(Int8Array::from(
                rows.iter().map(|r| r.is_weekend as i8).collect::<Vec<_>>(),
            )));
        } else {
            arrays.push(Arc::new(Float64Array::from(
                values.iter().map(|v| v[idx]).collect::<Vec<_>>(),
            )));
        }
    }

    write_parquet(path, Schema::new(fields), arrays)?;
    info!(
        "Saved feature table {:?}: {} rows x {} columns",
        path,
        table.len(),
        columns.len()
    );
    Ok(())
}

/// Reads a feature table, inferring the lag set from its columns.
///
/// Rows are re-sorted by date; duplicates and missing values are rejected.
pub fn load_feature_frame(path: &Path) -> Result<FeatureTable, StoreError> {
    let batches = read_parquet(path, "Feature data", &format!("date, ..., {TARGET_COLUMN}, ..."))?;
    let Some(first) = batches.first() else {
        return Err(ValidationError::Empty { table: "Feature" }.into());
    };

    let names = column_names(first);
    let lags = infer_lags(&names);
    if !names.iter().any(|n| n == TARGET_COLUMN) {
        return Err(ValidationError::MissingColumns {
            missing: TARGET_COLUMN.to_string(),
        }
        .into());
    }
    let expected = feature_columns(&lags);
    if names != expected {
        return Err(ValidationError::ColumnMismatch {
            expected: expected.join(", "),
            found: names.join(", "),
        }
        .into());
    }

    let mut rows = Vec::new();
    for batch in &batches {
        let dates = date_column(batch, path)?;
        let weekend = batch
            .column_by_name("is_weekend")
            .and_then(|c| c.as_any().downcast_ref::<Int8Array>())
            .ok_or_else(|| StoreError::parquet(path, "column 'is_weekend' is not Int8"))?;
        let numeric: Vec<&Float64Array> = expected[1..]
            .iter()
            .filter(|n| n.as_str() != "is_weekend")
            .map(|n| f64_column(batch, n, path))
            .collect::<Result<_, _>>()?;

        for i in 0..batch.num_rows() {
            let row_no = rows.len();
            let date = read_date(dates, i, row_no)?;
            // Nulls become NaN so FeatureTable reports them as missing values
            let v = |col: usize| {
                let array = numeric[col];
                if array.is_null(i) { f64::NAN } else { array.value(i) }
            };
            let is_weekend = if weekend.is_null(i) { -1 } else { weekend.value(i) };
            let is_weekend = u8::try_from(is_weekend).map_err(|_| ValidationError::InvalidType {
                column: "is_weekend".to_string(),
                row: row_no,
                value: is_weekend.to_string(),
                reason: "must be 0 or 1".to_string(),
            })?;

            // numeric order: rate, return_simple, return_log, pnl, pnl_next_day, then 5 per lag
            let lag_features = lags
                .iter()
                .enumerate()
                .map(|(k, &lag)| {
                    let base = 5 + 5 * k;
                    LagFeatures {
                        lag,
                        return_simple_lag: v(base),
                        return_log_lag: v(base + 1),
                        pnl_lag: v(base + 2),
                        roll_mean_return_simple: v(base + 3),
                        roll_vol_return_simple: v(base + 4),
                    }
                })
                .collect();

            rows.push(FeatureRow {
                date,
                rate: v(0),
                return_simple: v(1),
                return_log: v(2),
                pnl: v(3),
                pnl_next_day: v(4),
                is_weekend,
                lags: lag_features,
            });
        }
    }

    rows.sort_by_key(|r| r.date);
    Ok(FeatureTable::try_new(lags, rows)?)
}

/// Lags in column order, from `return_simple_lag_<L>` names.
fn infer_lags(names: &[String]) -> Vec<usize> {
    names
        .iter()
        .filter_map(|n| n.strip_prefix(LAG_PREFIX))
        .filter_map(|l| l.parse::<usize>().ok())
        .collect()
}

fn write_parquet(path: &Path, schema: Schema, columns: Vec<ArrayRef>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| StoreError::parquet(path, e))?;

    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| StoreError::parquet(path, e))?;
    writer.write(&batch).map_err(|e| StoreError::parquet(path, e))?;
    writer.close().map_err(|e| StoreError::parquet(path, e))?;
    Ok(())
}

fn read_parquet(path: &Path, kind: &'static str, expected: &str) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound {
            kind,
            path: path.to_path_buf(),
            expected: expected.to_string(),
        });
    }

    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| StoreError::parquet(path, e))?
        .build()
        .map_err(|e| StoreError::parquet(path, e))?;

    reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::parquet(path, e))
}

fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

fn date_column<'a>(batch: &'a RecordBatch, path: &Path) -> Result<&'a Date32Array, StoreError> {
    batch
        .column_by_name("date")
        .and_then(|c| c.as_any().downcast_ref::<Date32Array>())
        .ok_or_else(|| StoreError::parquet(path, "column 'date' is not Date32"))
}

fn f64_column<'a>(batch: &'a RecordBatch, name: &str, path: &Path) -> Result<&'a Float64Array, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| StoreError::parquet(path, format!("column '{name}' is not Float64")))
}

fn read_date(array: &Date32Array, i: usize, row: usize) -> Result<NaiveDate, ValidationError> {
    if array.is_null(i) {
        return Err(ValidationError::MissingValues {
            column: "date".to_string(),
            count: 1,
        });
    }
    from_days(array.value(i)).ok_or_else(|| ValidationError::InvalidType {
        column: "date".to_string(),
        row,
        value: array.value(i).to_string(),
        reason: "day offset out of range".to_string(),
    })
}

fn read_f64(array: &Float64Array, column: &str, i: usize, row: usize) -> Result<f64, ValidationError> {
    if array.is_null(i) || !array.value(i).is_finite() {
        return Err(ValidationError::InvalidType {
            column: column.to_string(),
            row,
            value: if array.is_null(i) {
                "null".to_string()
            } else {
                array.value(i).to_string()
            },
            reason: "expected a finite number".to_string(),
        });
    }
    Ok(array.value(i))
}
