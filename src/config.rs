use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::pipeline::analysis::AnalysisConfig;

/// Central configuration loaded from environment variables.
///
/// Every setting has a default, so an empty environment is valid. The .env
/// file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the static dataset for `demo`
    pub data_dir: PathBuf,
    /// Where `analyze` writes its tables and reports
    pub output_dir: PathBuf,
    pub seed: u64,
    pub max_features: usize,
    pub min_df: usize,
    pub max_df: f64,
    pub max_iter: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let defaults = AnalysisConfig::default();
        let config = Self {
            data_dir: env::var("REVIEW_INTEL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            output_dir: env::var("REVIEW_INTEL_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
            seed: parse_var("REVIEW_INTEL_SEED", defaults.seed)?,
            max_features: parse_var("REVIEW_INTEL_MAX_FEATURES", defaults.max_features)?,
            min_df: parse_var("REVIEW_INTEL_MIN_DF", defaults.min_df)?,
            max_df: parse_var("REVIEW_INTEL_MAX_DF", defaults.max_df)?,
            max_iter: parse_var("REVIEW_INTEL_MAX_ITER", defaults.max_iter)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            anyhow::bail!(
                "REVIEW_INTEL_MAX_DF must be in (0, 1], got {}",
                self.max_df
            );
        }
        if self.max_features == 0 {
            anyhow::bail!("REVIEW_INTEL_MAX_FEATURES must be at least 1");
        }
        if self.max_iter == 0 {
            anyhow::bail!("REVIEW_INTEL_MAX_ITER must be at least 1");
        }
        Ok(())
    }

    /// Pipeline settings derived from this configuration.
    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            max_features: self.max_features,
            min_df: self.min_df,
            max_df: self.max_df,
            seed: self.seed,
            max_iter: self.max_iter,
        }
    }
}

/// Read and parse an optional env var, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        _ => Ok(default),
    }
}
