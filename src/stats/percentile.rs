//! Percentile of absolute log-changes over a lag

use crate::data::RateSeries;
use crate::error::{FxStressError, Result};
use chrono::NaiveDate;

/// Default maximum run of missing lagged values bridged by interpolation
/// (a weekend plus a bank holiday)
pub const DEFAULT_GAP_LIMIT: usize = 3;

/// Percentile of a sample, ignoring `NaN` entries.
///
/// Uses linear interpolation between the two closest ranks. Returns `NaN`
/// when no finite value is present. `pct` is on a 0..=100 scale.
pub fn nan_percentile(values: &[f64], pct: f64) -> Result<f64> {
    validate_percentile(pct)?;

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Ok(f64::NAN);
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Ok(sorted[lo]);
    }
    let weight = rank - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * weight)
}

fn validate_percentile(pct: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(FxStressError::InvalidParameter(format!(
            "Percentile must be within [0, 100], got {}",
            pct
        )));
    }
    Ok(())
}

/// Daily `|ln(series(d) / lagged(d))|`, where the lagged copy has its short
/// gaps interpolated first. Missing inputs give `NaN` outputs.
pub fn abs_log_changes(series: &RateSeries, lag_days: usize, gap_limit: usize) -> Vec<f64> {
    let lagged = series.shift(lag_days).interpolate_gaps(gap_limit);
    series
        .values()
        .iter()
        .zip(lagged.values())
        .map(|(now, then)| (now / then).ln().abs())
        .collect()
}

/// Percentile of absolute log-changes over a fixed lag, evaluated from
/// `eval_start` up to an optional `eval_end`.
///
/// Observations after `eval_end` are discarded before lagging, so they can
/// neither enter the sample nor anchor an interpolated gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogChangePercentile {
    lag_days: usize,
    percentile: f64,
    eval_start: NaiveDate,
    eval_end: Option<NaiveDate>,
    gap_limit: usize,
}

impl LogChangePercentile {
    /// Create a new statistic; `percentile` is on a 0..=100 scale
    pub fn new(lag_days: usize, percentile: f64, eval_start: NaiveDate) -> Result<Self> {
        validate_percentile(percentile)?;
        Ok(Self {
            lag_days,
            percentile,
            eval_start,
            eval_end: None,
            gap_limit: DEFAULT_GAP_LIMIT,
        })
    }

    /// Override the interpolation gap limit
    pub fn with_gap_limit(mut self, gap_limit: usize) -> Self {
        self.gap_limit = gap_limit;
        self
    }

    /// Ignore every observation after `eval_end`
    pub fn with_eval_end(mut self, eval_end: NaiveDate) -> Self {
        self.eval_end = Some(eval_end);
        self
    }

    pub fn lag_days(&self) -> usize {
        self.lag_days
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    pub fn eval_start(&self) -> NaiveDate {
        self.eval_start
    }

    pub fn eval_end(&self) -> Option<NaiveDate> {
        self.eval_end
    }

    pub fn gap_limit(&self) -> usize {
        self.gap_limit
    }

    /// Evaluate on one series. `NaN` when nothing in the window is defined.
    pub fn compute(&self, series: &RateSeries) -> f64 {
        match self.eval_end {
            Some(end) if end < series.end() => match series.clip(series.start(), end) {
                Some(clipped) => self.compute_unbounded(&clipped),
                None => f64::NAN,
            },
            _ => self.compute_unbounded(series),
        }
    }

    fn compute_unbounded(&self, series: &RateSeries) -> f64 {
        let changes = abs_log_changes(series, self.lag_days, self.gap_limit);
        let from = series.position_from(self.eval_start);
        // Percentile was validated in `new`
        nan_percentile(&changes[from..], self.percentile).unwrap_or(f64::NAN)
    }
}

/// One-shot form of [`LogChangePercentile::compute`]
pub fn abs_ln_change_percentile(
    series: &RateSeries,
    lag_days: usize,
    percentile: f64,
    eval_start: NaiveDate,
    gap_limit: usize,
) -> Result<f64> {
    Ok(LogChangePercentile::new(lag_days, percentile, eval_start)?
        .with_gap_limit(gap_limit)
        .compute(series))
}
