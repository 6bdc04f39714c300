//! Stress run engine
//!
//! Computes one [`StressMatrix`] per liquidity horizon over a shared,
//! read-only [`RateTable`]. Horizons are independent and run in parallel.

use crate::config::StressConfig;
use crate::currency::{CurrencyRegistry, USD_CODE};
use crate::data::RateTable;
use crate::error::{FxStressError, Result};
use crate::report::{output_path, write_matrix_csv, MatrixSummary};
use crate::stats::{LogChangePercentile, StressMatrix};
use crate::window::{horizons_for, EvaluationWindow, LiquidityHorizon};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Output of one liquidity horizon
#[derive(Debug, Clone)]
pub struct HorizonResult {
    pub horizon: LiquidityHorizon,
    pub matrix: StressMatrix,
    pub summary: MatrixSummary,
}

/// Engine configuration resolved against a concrete evaluation window
#[derive(Debug, Clone)]
pub struct StressEngine {
    window: EvaluationWindow,
    horizons: Vec<LiquidityHorizon>,
    percentile: f64,
    gap_limit: usize,
}

impl StressEngine {
    /// Create an engine from a validated configuration
    pub fn new(config: &StressConfig, window: EvaluationWindow) -> Result<Self> {
        config.validate()?;
        let horizons = horizons_for(&config.liquidity_horizons_months, &window)?;
        Ok(Self {
            window,
            horizons,
            percentile: config.percentile,
            gap_limit: config.interpolation_gap_limit_days,
        })
    }

    pub fn window(&self) -> &EvaluationWindow {
        &self.window
    }

    pub fn horizons(&self) -> &[LiquidityHorizon] {
        &self.horizons
    }

    /// Add the constant USD column when the registry enables USD
    pub fn prepare_table(&self, table: RateTable, registry: &CurrencyRegistry) -> RateTable {
        let usd_enabled = registry.enabled().any(|r| r.code == USD_CODE);
        if usd_enabled && !table.contains(USD_CODE) {
            table.with_constant(USD_CODE, 1.0)
        } else {
            table
        }
    }

    /// Compute every horizon's matrix over the registry's enabled codes
    pub fn run(&self, table: &RateTable, registry: &CurrencyRegistry) -> Result<Vec<HorizonResult>> {
        let codes = registry.enabled_codes();
        if codes.len() < 2 {
            return Err(FxStressError::RegistryError(format!(
                "At least two enabled currencies are required, found {}",
                codes.len()
            )));
        }
        if !table.covers(self.window.data_start, self.window.end_date) {
            log::warn!(
                "Rate table spans {}..{}, window needs {}..{}",
                table.range().start,
                table.range().end,
                self.window.data_start,
                self.window.end_date
            );
        }

        log::info!(
            "Computing {} horizons over {} currencies, window {}",
            self.horizons.len(),
            codes.len(),
            self.window
        );

        self.horizons
            .par_iter()
            .map(|&horizon| {
                let stat = LogChangePercentile::new(
                    horizon.days,
                    self.percentile,
                    self.window.start_date,
                )?
                .with_eval_end(self.window.end_date)
                .with_gap_limit(self.gap_limit);
                let matrix = StressMatrix::build(table, &codes, &stat)?;
                let summary = MatrixSummary::from_matrix(&matrix);
                log::info!("Horizon {}: {}", horizon, summary);
                Ok(HorizonResult {
                    horizon,
                    matrix,
                    summary,
                })
            })
            .collect()
    }

    /// Write each result to `{dir}/{prefix}_{days}_day.csv`
    pub fn write_all(results: &[HorizonResult], dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        results
            .iter()
            .map(|result| {
                let path = output_path(dir, prefix, result.horizon.days);
                write_matrix_csv(&path, &result.matrix)?;
                log::info!("Wrote {}", path.display());
                Ok(path)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const REGISTRY_CSV: &str = "\
Label,Code,Source,Quandl_Code,Enabled
Euro,EUR,BOE,XUDLERD,1
Sterling,GBP,BOE,XUDLGBD,1
";

    fn engine() -> StressEngine {
        let config = StressConfig {
            lookback_years: 1,
            ..StressConfig::default()
        };
        let window = EvaluationWindow::ending_at(d(2024, 12, 31), 1, 366).unwrap();
        StressEngine::new(&config, window).unwrap()
    }

    fn table(engine: &StressEngine) -> RateTable {
        let w = engine.window();
        let mut table = RateTable::new(w.data_start, w.end_date).unwrap();
        let n = table.num_days();
        let eur: Vec<_> = (0..n)
            .map(|i| (table.range().date_at(i), 1.1 + (i as f64 / 23.0).sin() * 0.04))
            .collect();
        table.insert_points("EUR", &eur);
        table.insert_points("GBP", &eur);
        table
    }

    #[test]
    fn test_run_all_horizons() {
        let engine = engine();
        let registry = CurrencyRegistry::from_reader(REGISTRY_CSV.as_bytes())
            .unwrap()
            .with_usd();
        let table = engine.prepare_table(table(&engine), &registry);
        let results = engine.run(&table, &registry).unwrap();

        let days: Vec<usize> = results.iter().map(|r| r.horizon.days).collect();
        assert_eq!(days, vec![30, 91, 182, 273, 365]);
        for result in &results {
            // Identical EUR and GBP series
            assert_eq!(result.matrix.get("EUR", "GBP"), Some(0.0));
            assert_eq!(result.matrix.codes().len(), 3);
        }
    }

    #[test]
    fn test_run_ignores_rates_after_window_end() {
        let config = StressConfig {
            lookback_years: 1,
            percentile: 100.0,
            liquidity_horizons_months: vec![1],
            ..StressConfig::default()
        };
        let window = EvaluationWindow::ending_at(d(2024, 12, 31), 1, 366).unwrap();
        let engine = StressEngine::new(&config, window).unwrap();

        // EUR is flat inside the window and triples after it
        let mut table = RateTable::new(window.data_start, d(2026, 9, 30)).unwrap();
        let eur: Vec<_> = table
            .range()
            .days()
            .map(|day| (day, if day <= window.end_date { 1.0 } else { 3.0 }))
            .collect();
        table.insert_points("EUR", &eur);
        table.insert_points("GBP", &eur);

        let registry = CurrencyRegistry::from_reader(REGISTRY_CSV.as_bytes())
            .unwrap()
            .with_usd();
        let table = engine.prepare_table(table, &registry);
        let results = engine.run(&table, &registry).unwrap();
        assert_eq!(results[0].matrix.get("EUR", "USD"), Some(0.0));
        assert_eq!(results[0].matrix.get("GBP", "USD"), Some(0.0));
    }

    #[test]
    fn test_run_requires_two_currencies() {
        let engine = engine();
        let registry = CurrencyRegistry::new(vec![]).unwrap().with_usd();
        let table = engine.prepare_table(table(&engine), &registry);
        assert!(engine.run(&table, &registry).is_err());
    }

    #[test]
    fn test_run_fails_on_missing_series() {
        let engine = engine();
        let registry = CurrencyRegistry::from_reader(REGISTRY_CSV.as_bytes()).unwrap();
        let w = engine.window();
        let table = RateTable::new(w.data_start, w.end_date)
            .unwrap()
            .with_constant("EUR", 1.1);
        assert!(matches!(
            engine.run(&table, &registry),
            Err(FxStressError::MissingCurrency(_))
        ));
    }

    #[test]
    fn test_write_all() {
        let engine = engine();
        let registry = CurrencyRegistry::from_reader(REGISTRY_CSV.as_bytes()).unwrap();
        let table = table(&engine);
        let results = engine.run(&table, &registry).unwrap();
        let dir = tempdir().unwrap();
        let paths = StressEngine::write_all(&results, dir.path(), "quandl_FX_stress").unwrap();
        assert_eq!(paths.len(), 5);
        assert!(dir.path().join("quandl_FX_stress_365_day.csv").exists());
    }
}
