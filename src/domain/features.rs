//! Feature table types for next-day P&L forecasting.
//!
//! Every value at row `t` is computable from observations at or before `t`,
//! except `pnl_next_day`, the one-step-ahead target.

use super::errors::ValidationError;
use chrono::NaiveDate;

pub const TARGET_COLUMN: &str = "pnl_next_day";

/// Fixed leading columns, in persisted order.
pub const BASE_COLUMNS: [&str; 7] = [
    "date",
    "rate",
    "return_simple",
    "return_log",
    "pnl",
    TARGET_COLUMN,
    "is_weekend",
];

/// Column names for one lag, in persisted order.
pub fn lag_column_names(lag: usize) -> [String; 5] {
    [
        format!("return_simple_lag_{lag}"),
        format!("return_log_lag_{lag}"),
        format!("pnl_lag_{lag}"),
        format!("roll_mean_return_simple_{lag}"),
        format!("roll_vol_return_simple_{lag}"),
    ]
}

/// Full column list for a lag set.
pub fn feature_columns(lags: &[usize]) -> Vec<String> {
    let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
    for &lag in lags {
        columns.extend(lag_column_names(lag));
    }
    columns
}

/// Lagged and rolling statistics for one lag `L`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagFeatures {
    pub lag: usize,
    pub return_simple_lag: f64,
    pub return_log_lag: f64,
    pub pnl_lag: f64,
    /// Mean of the last `L` simple returns, current one included
    pub roll_mean_return_simple: f64,
    /// Population std (ddof = 0) of the last `L` simple returns
    pub roll_vol_return_simple: f64,
}

impl LagFeatures {
    fn values(&self) -> [f64; 5] {
        [
            self.return_simple_lag,
            self.return_log_lag,
            self.pnl_lag,
            self.roll_mean_return_simple,
            self.roll_vol_return_simple,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub rate: f64,
    pub return_simple: f64,
    pub return_log: f64,
    pub pnl: f64,
    pub pnl_next_day: f64,
    /// 1 on Saturday/Sunday, else 0
    pub is_weekend: u8,
    /// One entry per configured lag, ascending
    pub lags: Vec<LagFeatures>,
}

impl FeatureRow {
    /// Every column except `date`, in [`feature_columns`] order.
    pub fn numeric_values(&self) -> Vec<f64> {
        let mut values = vec![
            self.rate,
            self.return_simple,
            self.return_log,
            self.pnl,
            self.pnl_next_day,
            f64::from(self.is_weekend),
        ];
        for lag in &self.lags {
            values.extend(lag.values());
        }
        values
    }
}

/// Validated feature table: non-empty, no missing values, strictly
/// increasing dates, every row carrying exactly the table's lag set.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    lags: Vec<usize>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn try_new(lags: Vec<usize>, rows: Vec<FeatureRow>) -> Result<Self, ValidationError> {
        if lags.is_empty() || lags.contains(&0) || lags.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ValidationError::InvalidLags(lags));
        }
        if rows.is_empty() {
            return Err(ValidationError::Empty { table: "Feature" });
        }

        let table = Self { lags, rows };
        let columns = table.numeric_columns();

        for (idx, row) in table.rows.iter().enumerate() {
            let row_lags: Vec<usize> = row.lags.iter().map(|l| l.lag).collect();
            if row_lags != table.lags {
                return Err(ValidationError::ColumnMismatch {
                    expected: feature_columns(&table.lags).join(", "),
                    found: feature_columns(&row_lags).join(", "),
                });
            }

            if row.is_weekend > 1 {
                return Err(ValidationError::InvalidType {
                    column: "is_weekend".to_string(),
                    row: idx,
                    value: row.is_weekend.to_string(),
                    reason: "must be 0 or 1".to_string(),
                });
            }
        }

        for (col_idx, column) in columns.iter().enumerate() {
            let count = table
                .rows
                .iter()
                .filter(|row| !row.numeric_values()[col_idx].is_finite())
                .count();
            if count > 0 {
                return Err(ValidationError::MissingValues {
                    column: column.clone(),
                    count,
                });
            }
        }

        if let Some(pair) = table.rows.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(ValidationError::NotStrictlyIncreasing {
                previous: pair[0].date.to_string(),
                next: pair[1].date.to_string(),
            });
        }

        Ok(table)
    }

    pub fn lags(&self) -> &[usize] {
        &self.lags
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        feature_columns(&self.lags)
    }

    /// All columns except `date`.
    pub fn numeric_columns(&self) -> Vec<String> {
        feature_columns(&self.lags).into_iter().skip(1).collect()
    }

    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.numeric_columns().iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r.numeric_values()[idx]).collect())
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// Dated numeric design matrix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }
}

/// Chronological train/test partition. Train strictly precedes test.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSplit {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}
