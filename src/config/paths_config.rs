//! Project paths and directory setup.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self::rooted_at(Path::new("."))
    }
}

impl PathsConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())),
            reports_dir: PathBuf::from(
                env::var("REPORTS_DIR").unwrap_or_else(|_| "reports".to_string()),
            ),
        }
    }

    /// Layout rooted at `root`, used by tests and by callers that relocate the project.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            data_dir: root.join("data"),
            reports_dir: root.join("reports"),
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    pub fn raw_file(&self) -> PathBuf {
        self.raw_dir().join("usd_gtq_daily.csv")
    }

    pub fn processed_file(&self) -> PathBuf {
        self.processed_dir().join("fx_rates.parquet")
    }

    pub fn features_file(&self) -> PathBuf {
        self.processed_dir().join("features.parquet")
    }

    pub fn metrics_file(&self) -> PathBuf {
        self.reports_dir.join("metrics.json")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.raw_dir(),
            self.processed_dir(),
            self.models_dir(),
            self.reports_dir.clone(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {:?}", dir))?;
        }
        Ok(())
    }
}
