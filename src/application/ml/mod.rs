//! Regression models behind [`RegressionModel`](crate::domain::ports::RegressionModel).

pub mod design;
pub mod forest;
pub mod linear;

pub use forest::QuantileForestModel;
pub use linear::{LinearMeanModel, QuantileLinearModel};
