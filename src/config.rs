//! Run configuration
//!
//! Every field has a default, so a partial TOML file (or none at all) is a
//! valid configuration. Loading the file itself is left to the binary.

use crate::error::{FxStressError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "QUANDL_API_KEY";

/// Data source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Provider API key; falls back to `QUANDL_API_KEY`
    pub api_key: Option<String>,
    /// API root URL
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.quandl.com/api/v3".to_string(),
        }
    }
}

impl SourceConfig {
    /// Configured key, else the environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

/// Parameters of a stress run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Length of the evaluation window in years
    pub lookback_years: u32,
    /// Percentile of absolute log-changes (0..=100)
    pub percentile: f64,
    /// Liquidity horizons in months
    pub liquidity_horizons_months: Vec<u32>,
    /// Longest run of missing lagged values bridged by interpolation
    pub interpolation_gap_limit_days: usize,
    /// Extra days of data fetched before the evaluation window
    pub data_lookback_days: i64,
    /// Fixed evaluation end date instead of the last quarter-end
    pub end_date: Option<NaiveDate>,
    pub source: SourceConfig,
    /// Currency registry CSV
    pub registry_path: PathBuf,
    /// Gzip CSV cache of downloaded rates
    pub cache_path: Option<PathBuf>,
    /// Directory receiving one CSV per horizon
    pub output_dir: PathBuf,
    /// File name prefix of result CSVs
    pub output_prefix: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            lookback_years: 10,
            percentile: 95.0,
            liquidity_horizons_months: vec![1, 3, 6, 9, 12],
            interpolation_gap_limit_days: 3,
            data_lookback_days: 366,
            end_date: None,
            source: SourceConfig::default(),
            registry_path: PathBuf::from("quandl_BOE_FX_codes.csv"),
            cache_path: Some(PathBuf::from("quandl_BOE_FX_data.csv.gz")),
            output_dir: PathBuf::from("."),
            output_prefix: "quandl_FX_stress".to_string(),
        }
    }
}

impl StressConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.lookback_years == 0 {
            return Err(FxStressError::ConfigError(
                "lookback_years must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(FxStressError::ConfigError(format!(
                "percentile must be within [0, 100], got {}",
                self.percentile
            )));
        }
        if self.liquidity_horizons_months.is_empty() {
            return Err(FxStressError::ConfigError(
                "liquidity_horizons_months must not be empty".to_string(),
            ));
        }
        if self.liquidity_horizons_months.contains(&0) {
            return Err(FxStressError::ConfigError(
                "liquidity horizons must be at least one month".to_string(),
            ));
        }
        if self.data_lookback_days < 0 {
            return Err(FxStressError::ConfigError(
                "data_lookback_days must be non-negative".to_string(),
            ));
        }
        if self.output_prefix.trim().is_empty() {
            return Err(FxStressError::ConfigError(
                "output_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
