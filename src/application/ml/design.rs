//! Shared helpers for the smartcore-backed models.

use crate::domain::errors::ModelError;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use statrs::statistics::{Data, OrderStatistics};

/// Columns that vary in the training data.
///
/// Constant columns (a one-observation rolling volatility is always zero)
/// break per-column standardization, so they are removed before fitting and
/// the same selection is applied at prediction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    width: usize,
    kept: Vec<usize>,
}

impl ColumnFilter {
    pub fn fit(x: &[Vec<f64>]) -> Self {
        let width = x.first().map_or(0, Vec::len);
        let kept = (0..width)
            .filter(|&col| {
                let (min, max) = x.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), row| {
                    (lo.min(row[col]), hi.max(row[col]))
                });
                max - min > f64::EPSILON * max.abs().max(1.0)
            })
            .collect();
        Self { width, kept }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn kept(&self) -> &[usize] {
        &self.kept
    }

    pub fn apply(&self, model: &str, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        x.iter()
            .map(|row| {
                if row.len() != self.width {
                    return Err(ModelError::Toolkit {
                        model: model.to_string(),
                        stage: "predict",
                        reason: format!("expected {} columns, got {}", self.width, row.len()),
                    });
                }
                Ok(self.kept.iter().map(|&c| row[c]).collect())
            })
            .collect()
    }
}

pub fn check_shape(model: &str, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
    if x.is_empty() || x.len() != y.len() {
        return Err(ModelError::ShapeMismatch {
            model: model.to_string(),
            rows: x.len(),
            targets: y.len(),
        });
    }
    let expected = x[0].len();
    if let Some((row, found)) = x
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != expected)
    {
        return Err(ModelError::RaggedRows {
            model: model.to_string(),
            row,
            expected,
            found,
        });
    }
    Ok(())
}

pub fn to_matrix(model: &str, stage: &'static str, x: Vec<Vec<f64>>) -> Result<DenseMatrix<f64>, ModelError> {
    DenseMatrix::from_2d_vec(&x).map_err(|e| ModelError::Toolkit {
        model: model.to_string(),
        stage,
        reason: format!("Matrix error: {}", e),
    })
}

pub fn ensure_finite(model: &str, predictions: Vec<f64>) -> Result<Vec<f64>, ModelError> {
    if predictions.iter().all(|p| p.is_finite()) {
        Ok(predictions)
    } else {
        Err(ModelError::NonFinitePrediction {
            model: model.to_string(),
        })
    }
}

pub fn check_quantile(level: f64) -> Result<f64, ModelError> {
    if level > 0.0 && level < 1.0 {
        Ok(level)
    } else {
        Err(ModelError::InvalidQuantile(level))
    }
}

/// Empirical `level` quantile of `actual - fitted`.
pub fn residual_quantile(actual: &[f64], fitted: &[f64], level: f64) -> f64 {
    let residuals: Vec<f64> = actual.iter().zip(fitted).map(|(a, f)| a - f).collect();
    Data::new(residuals).quantile(level)
}
