//! Forecast accuracy metrics.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    mean(actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()))
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mean(actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2))).sqrt()
}

/// Mean quantile (pinball) loss at `level`.
pub fn pinball_loss(actual: &[f64], predicted: &[f64], level: f64) -> f64 {
    mean(actual.iter().zip(predicted).map(|(a, p)| {
        let diff = a - p;
        if diff >= 0.0 {
            level * diff
        } else {
            (level - 1.0) * diff
        }
    }))
}

/// Share of outcomes that fell below the predicted quantile.
pub fn breach_rate(actual: &[f64], quantile: &[f64]) -> f64 {
    mean(
        actual
            .iter()
            .zip(quantile)
            .map(|(a, q)| if a < q { 1.0 } else { 0.0 }),
    )
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return f64::NAN;
    }
    values.mean()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanForecastMetrics {
    pub mae: f64,
    pub rmse: f64,
}

impl MeanForecastMetrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            mae: mae(actual, predicted),
            rmse: rmse(actual, predicted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileForecastMetrics {
    pub quantile_level: f64,
    pub pinball_loss: f64,
    pub breach_rate: f64,
    /// Number of test rows below the forecast
    pub breaches: usize,
}

impl QuantileForecastMetrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64], level: f64) -> Self {
        Self {
            quantile_level: level,
            pinball_loss: pinball_loss(actual, predicted, level),
            breach_rate: breach_rate(actual, predicted),
            breaches: actual.iter().zip(predicted).filter(|(a, q)| a < q).count(),
        }
    }
}
