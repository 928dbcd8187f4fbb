use super::design::{check_quantile, check_shape, ensure_finite, residual_quantile, to_matrix};
use crate::config::ModelEnvConfig;
use crate::domain::errors::ModelError;
use crate::domain::ports::RegressionModel;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Seeded random forest mean plus the training-residual quantile
#[derive(Debug, Serialize, Deserialize)]
pub struct QuantileForestModel {
    quantile: f64,
    n_trees: usize,
    max_depth: u16,
    seed: u64,
    width: Option<usize>,
    inner: Option<Forest>,
    offset: Option<f64>,
}

impl QuantileForestModel {
    pub const NAME: &'static str = "quantile_forest";

    pub fn new(quantile: f64, n_trees: usize, max_depth: u16, seed: u64) -> Result<Self, ModelError> {
        if n_trees == 0 {
            return Err(ModelError::Toolkit {
                model: Self::NAME.to_string(),
                stage: "configure",
                reason: "n_trees must be at least 1".to_string(),
            });
        }
        Ok(Self {
            quantile: check_quantile(quantile)?,
            n_trees,
            max_depth,
            seed,
            width: None,
            inner: None,
            offset: None,
        })
    }

    pub fn from_config(config: &ModelEnvConfig) -> Result<Self, ModelError> {
        Self::new(
            config.quantile_level,
            config.n_trees,
            config.max_depth,
            config.random_seed,
        )
    }

    pub fn offset(&self) -> Option<f64> {
        self.offset
    }

    fn raw_predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let (Some(inner), Some(width)) = (&self.inner, self.width) else {
            return Err(ModelError::NotFitted {
                model: Self::NAME.to_string(),
            });
        };
        if x.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(row) = x.iter().find(|r| r.len() != width) {
            return Err(ModelError::Toolkit {
                model: Self::NAME.to_string(),
                stage: "predict",
                reason: format!("expected {} columns, got {}", width, row.len()),
            });
        }

        let matrix = to_matrix(Self::NAME, "predict", x.to_vec())?;
        inner.predict(&matrix).map_err(|e| ModelError::Toolkit {
            model: Self::NAME.to_string(),
            stage: "predict",
            reason: format!("Predict error: {}", e),
        })
    }
}

impl RegressionModel for QuantileForestModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_shape(Self::NAME, x, y)?;
        let matrix = to_matrix(Self::NAME, "fit", x.to_vec())?;

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_trees)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(2)
            .with_seed(self.seed);
        let inner = RandomForestRegressor::fit(&matrix, &y.to_vec(), params).map_err(|e| {
            ModelError::Toolkit {
                model: Self::NAME.to_string(),
                stage: "fit",
                reason: format!("Training error: {}", e),
            }
        })?;

        self.width = x.first().map(Vec::len);
        self.inner = Some(inner);
        let fitted = self.raw_predict(x)?;
        let offset = residual_quantile(y, &fitted, self.quantile);
        self.offset = Some(offset);

        debug!(
            "{}: {} trees, depth {}, seed {}, residual q{} = {:.4}",
            Self::NAME,
            self.n_trees,
            self.max_depth,
            self.seed,
            self.quantile,
            offset
        );
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let offset = self.offset.ok_or_else(|| ModelError::NotFitted {
            model: Self::NAME.to_string(),
        })?;
        let mean = self.raw_predict(x)?;
        ensure_finite(Self::NAME, mean.into_iter().map(|m| m + offset).collect())
    }
}
