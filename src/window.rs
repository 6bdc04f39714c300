//! Evaluation window and liquidity horizons
//!
//! The evaluation period ends on the most recent completed calendar quarter
//! and reaches back a whole number of years. Rate data has to start earlier
//! still, so the longest liquidity horizon has history at the first
//! evaluation date.

use crate::error::{FxStressError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Average days per month used to convert horizons to day lags
const DAYS_PER_YEAR: f64 = 365.25;

/// Date boundaries of one stress run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWindow {
    /// First date on which returns are evaluated
    pub start_date: NaiveDate,
    /// Last date of data (a quarter-end)
    pub end_date: NaiveDate,
    /// First date of downloaded data
    pub data_start: NaiveDate,
}

impl EvaluationWindow {
    /// Window ending at `end_date` and covering `lookback_years` before it
    pub fn ending_at(end_date: NaiveDate, lookback_years: u32, data_lookback_days: i64) -> Result<Self> {
        if lookback_years == 0 {
            return Err(FxStressError::InvalidParameter(
                "lookback_years must be at least 1".to_string(),
            ));
        }
        if data_lookback_days < 0 {
            return Err(FxStressError::InvalidParameter(format!(
                "data_lookback_days must be non-negative, got {}",
                data_lookback_days
            )));
        }
        let back = end_date
            .checked_sub_months(Months::new(12 * lookback_years))
            .ok_or_else(|| {
                FxStressError::InvalidParameter(format!(
                    "Cannot go back {} years from {}",
                    lookback_years, end_date
                ))
            })?;
        let start_date = back + Duration::days(1);
        let data_start = start_date - Duration::days(data_lookback_days);
        Ok(Self {
            start_date,
            end_date,
            data_start,
        })
    }

    /// Window ending at the last completed quarter before `today`
    pub fn from_today(today: NaiveDate, lookback_years: u32, data_lookback_days: i64) -> Result<Self> {
        Self::ending_at(last_quarter_end(today), lookback_years, data_lookback_days)
    }

    /// Days of history available before the first evaluation date
    pub fn history_days(&self) -> i64 {
        (self.start_date - self.data_start).num_days()
    }
}

impl fmt::Display for EvaluationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} (data from {})",
            self.start_date, self.end_date, self.data_start
        )
    }
}

/// Last day of the most recent fully completed calendar quarter
pub fn last_quarter_end(today: NaiveDate) -> NaiveDate {
    let quarter_start_month = 3 * ((today.month() - 1) / 3) + 1;
    // Day 1 of a month 1, 4, 7 or 10 is always valid
    let quarter_start = NaiveDate::from_ymd_opt(today.year(), quarter_start_month, 1)
        .unwrap_or(today);
    quarter_start - Duration::days(1)
}

/// Convert a horizon in months to a lag in calendar days
pub fn liquidity_days(months: u32) -> usize {
    (months as f64 * DAYS_PER_YEAR / 12.0).floor() as usize
}

/// Holding/unwind period over which returns are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiquidityHorizon {
    pub months: u32,
    pub days: usize,
}

impl LiquidityHorizon {
    pub fn from_months(months: u32) -> Self {
        Self {
            months,
            days: liquidity_days(months),
        }
    }
}

impl fmt::Display for LiquidityHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}M ({} days)", self.months, self.days)
    }
}

/// Build horizons from month counts, warning when a horizon is longer than
/// the history available before the evaluation window.
pub fn horizons_for(months: &[u32], window: &EvaluationWindow) -> Result<Vec<LiquidityHorizon>> {
    if months.is_empty() {
        return Err(FxStressError::InvalidParameter(
            "At least one liquidity horizon is required".to_string(),
        ));
    }
    months
        .iter()
        .map(|&m| {
            if m == 0 {
                return Err(FxStressError::InvalidParameter(
                    "Liquidity horizons must be at least one month".to_string(),
                ));
            }
            let horizon = LiquidityHorizon::from_months(m);
            if horizon.days as i64 > window.history_days() {
                log::warn!(
                    "Horizon {} exceeds the {} days of history before {}; early dates will be missing",
                    horizon,
                    window.history_days(),
                    window.start_date
                );
            }
            Ok(horizon)
        })
        .collect()
}
