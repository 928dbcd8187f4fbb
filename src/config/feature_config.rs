//! Feature construction and split configuration.

use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_LAGS: [usize; 5] = [1, 5, 10, 20, 60];

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEnvConfig {
    /// Position size in USD used to scale returns into P&L
    pub notional: f64,
    pub lags: Vec<usize>,
    /// Test window length in rows, not calendar days
    pub test_days: usize,
}

impl Default for FeatureEnvConfig {
    fn default() -> Self {
        Self {
            notional: 10_000.0,
            lags: DEFAULT_LAGS.to_vec(),
            test_days: 250,
        }
    }
}

impl FeatureEnvConfig {
    pub fn from_env() -> Result<Self> {
        let notional = env::var("NOTIONAL")
            .unwrap_or_else(|_| "10000".to_string())
            .parse::<f64>()
            .context("Failed to parse NOTIONAL")?;
        if notional <= 0.0 || !notional.is_finite() {
            anyhow::bail!("NOTIONAL must be a positive number, got {}", notional);
        }

        let lags_str = env::var("FEATURE_LAGS").unwrap_or_else(|_| "1,5,10,20,60".to_string());
        let lags = parse_lags(&lags_str)?;

        let test_days = env::var("TEST_DAYS")
            .unwrap_or_else(|_| "250".to_string())
            .parse::<usize>()
            .context("Failed to parse TEST_DAYS")?;
        if test_days == 0 {
            anyhow::bail!("TEST_DAYS must be at least 1");
        }

        Ok(Self {
            notional,
            lags,
            test_days,
        })
    }
}

/// Parses a comma-separated lag list, e.g. `"1,5,10"`.
pub fn parse_lags(value: &str) -> Result<Vec<usize>> {
    let lags = value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .with_context(|| format!("Invalid lag '{}' in FEATURE_LAGS", s))
        })
        .collect::<Result<Vec<usize>>>()?;

    if lags.is_empty() || lags.contains(&0) {
        anyhow::bail!(
            "FEATURE_LAGS must be a non-empty list of positive integers, got '{}'",
            value
        );
    }
    Ok(lags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lags() {
        assert_eq!(parse_lags("1, 5,10").unwrap(), vec![1, 5, 10]);
        assert!(parse_lags("").is_err());
        assert!(parse_lags("0,5").is_err());
        assert!(parse_lags("1,x").is_err());
    }
}
