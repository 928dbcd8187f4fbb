//! Configuration module for fxvar.
//!
//! Configuration is loaded from environment variables (optionally via `.env`)
//! once at the entry point and then threaded explicitly through the pipeline.
//! Core functions never read the environment themselves.

mod feature_config;
mod model_config;
mod observability_config;
mod paths_config;
mod soap_config;

pub use feature_config::{DEFAULT_LAGS, FeatureEnvConfig, parse_lags};
pub use model_config::ModelEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use paths_config::PathsConfig;
pub use soap_config::{
    DEFAULT_ENDPOINT, DEFAULT_NAMESPACE, DEFAULT_SOAP_ACTION, DEFAULT_START_DATE,
    SOAP_ENVELOPE_NAMESPACE, SoapEnvConfig, SoapSchema,
};

use anyhow::Result;

/// Main application configuration, aggregated by concern.
#[derive(Debug, Clone)]
pub struct Config {
    pub soap: SoapEnvConfig,
    pub features: FeatureEnvConfig,
    pub model: ModelEnvConfig,
    pub paths: PathsConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            soap: SoapEnvConfig::from_env()?,
            features: FeatureEnvConfig::from_env()?,
            model: ModelEnvConfig::from_env()?,
            paths: PathsConfig::from_env(),
            observability: ObservabilityEnvConfig::from_env(),
        })
    }
}
