use super::design::{
    ColumnFilter, check_quantile, check_shape, ensure_finite, residual_quantile, to_matrix,
};
use crate::domain::errors::ModelError;
use crate::domain::ports::RegressionModel;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::ridge_regression::{
    RidgeRegression, RidgeRegressionParameters, RidgeRegressionSolverName,
};
use tracing::debug;

/// Penalty on standardized coefficients. Small enough to leave a
/// well-conditioned fit unchanged, large enough to resolve exact collinearity
/// such as `pnl = notional * return_simple`.
const RIDGE_ALPHA: f64 = 1e-6;

type Ridge = RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Least-squares mean forecast of the target
#[derive(Debug, Serialize, Deserialize)]
pub struct LinearMeanModel {
    filter: Option<ColumnFilter>,
    inner: Option<Ridge>,
}

impl LinearMeanModel {
    pub const NAME: &'static str = "linear_mean";

    pub fn new() -> Self {
        Self {
            filter: None,
            inner: None,
        }
    }

    fn fitted(&self) -> Result<(&ColumnFilter, &Ridge), ModelError> {
        match (&self.filter, &self.inner) {
            (Some(filter), Some(inner)) => Ok((filter, inner)),
            _ => Err(ModelError::NotFitted {
                model: Self::NAME.to_string(),
            }),
        }
    }
}

impl Default for LinearMeanModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionModel for LinearMeanModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        check_shape(Self::NAME, x, y)?;
        let filter = ColumnFilter::fit(x);
        let matrix = to_matrix(Self::NAME, "fit", filter.apply(Self::NAME, x)?)?;

        let params = RidgeRegressionParameters::default()
            .with_alpha(RIDGE_ALPHA)
            .with_solver(RidgeRegressionSolverName::Cholesky)
            .with_normalize(true);
        let inner = RidgeRegression::fit(&matrix, &y.to_vec(), params).map_err(|e| {
            ModelError::Toolkit {
                model: Self::NAME.to_string(),
                stage: "fit",
                reason: format!("Training error: {}", e),
            }
        })?;

        debug!(
            "{}: fitted on {} rows, {}/{} columns kept",
            Self::NAME,
            x.len(),
            filter.kept().len(),
            filter.width()
        );
        self.filter = Some(filter);
        self.inner = Some(inner);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let (filter, inner) = self.fitted()?;
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let matrix = to_matrix(Self::NAME, "predict", filter.apply(Self::NAME, x)?)?;
        let predictions = inner.predict(&matrix).map_err(|e| ModelError::Toolkit {
            model: Self::NAME.to_string(),
            stage: "predict",
            reason: format!("Predict error: {}", e),
        })?;
        ensure_finite(Self::NAME, predictions)
    }
}

/// Lower-tail quantile forecast: linear mean plus the empirical quantile of
/// the training residuals.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuantileLinearModel {
    quantile: f64,
    mean: LinearMeanModel,
    offset: Option<f64>,
}

impl QuantileLinearModel {
    pub const NAME: &'static str = "quantile_linear";

    pub fn new(quantile: f64) -> Result<Self, ModelError> {
        Ok(Self {
            quantile: check_quantile(quantile)?,
            mean: LinearMeanModel::new(),
            offset: None,
        })
    }

    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    pub fn offset(&self) -> Option<f64> {
        self.offset
    }
}

impl RegressionModel for QuantileLinearModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        self.mean.fit(x, y)?;
        let fitted = self.mean.predict(x)?;
        self.offset = Some(residual_quantile(y, &fitted, self.quantile));
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let offset = self.offset.ok_or_else(|| ModelError::NotFitted {
            model: Self::NAME.to_string(),
        })?;
        let mean = self.mean.predict(x)?;
        ensure_finite(Self::NAME, mean.into_iter().map(|m| m + offset).collect())
    }
}
