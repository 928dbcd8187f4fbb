use super::errors::{ModelError, TransportFailure};
use async_trait::async_trait;

/// Capability to perform one SOAP POST attempt.
///
/// Implementations do not retry; the acquisition layer owns the retry policy.
#[async_trait]
pub trait SoapTransport: Send + Sync {
    fn endpoint(&self) -> &str;

    /// Posts one envelope and returns the raw response bytes.
    async fn post(&self, envelope: &str) -> Result<Vec<u8>, TransportFailure>;
}

/// Regression model over a dense numeric matrix and a target vector
pub trait RegressionModel {
    fn name(&self) -> &str;

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError>;

    /// One finite prediction per input row.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}
