use anyhow::{Context, Result};
use std::env;

/// Model-layer settings
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    /// Lower-tail quantile forecast, e.g. 0.05 for a 95% VaR
    pub quantile_level: f64,
    pub random_seed: u64,
    pub n_trees: usize,
    pub max_depth: u16,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            quantile_level: 0.05,
            random_seed: 42,
            n_trees: 100,
            max_depth: 8,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let quantile_level = env::var("QUANTILE_LEVEL")
            .unwrap_or_else(|_| "0.05".to_string())
            .parse::<f64>()
            .context("Failed to parse QUANTILE_LEVEL")?;
        if !(quantile_level > 0.0 && quantile_level < 1.0) {
            anyhow::bail!("QUANTILE_LEVEL must be in (0, 1), got {}", quantile_level);
        }

        let random_seed = env::var("RANDOM_SEED")
            .unwrap_or_else(|_| "42".to_string())
            .parse::<u64>()
            .context("Failed to parse RANDOM_SEED")?;

        let n_trees = env::var("N_TREES")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<usize>()
            .context("Failed to parse N_TREES")?;

        let max_depth = env::var("MAX_DEPTH")
            .unwrap_or_else(|_| "8".to_string())
            .parse::<u16>()
            .context("Failed to parse MAX_DEPTH")?;

        Ok(Self {
            quantile_level,
            random_seed,
            n_trees,
            max_depth,
        })
    }
}
