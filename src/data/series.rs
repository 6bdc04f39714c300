//! Dense daily rate series
//!
//! A [`RateSeries`] holds one slot per calendar day, weekends and holidays
//! included. Missing observations are stored as `NaN` so that lagging,
//! division and log transforms propagate gaps without special casing.

use crate::error::{FxStressError, Result};
use crate::types::{DateRange, Rate, RatePoint};
use chrono::NaiveDate;

/// Daily series of rates over a contiguous calendar range
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    range: DateRange,
    values: Vec<Rate>,
}

impl RateSeries {
    /// Create a series from raw daily values starting at `start`
    pub fn new(start: NaiveDate, values: Vec<Rate>) -> Result<Self> {
        if values.is_empty() {
            return Err(FxStressError::DataError(
                "Rate series must contain at least one day".to_string(),
            ));
        }
        let end = start + chrono::Duration::days(values.len() as i64 - 1);
        let range = DateRange { start, end };
        Ok(Self { range, values })
    }

    /// Series with every slot missing
    pub fn empty(range: DateRange) -> Self {
        Self {
            range,
            values: vec![f64::NAN; range.len()],
        }
    }

    /// Series with the same value on every day
    pub fn constant(range: DateRange, value: Rate) -> Self {
        Self {
            range,
            values: vec![value; range.len()],
        }
    }

    /// Build a series from sparse observations.
    ///
    /// Points outside `range` are dropped. Non-positive or non-finite rates
    /// are treated as missing. Returns the series and the number of points
    /// that were accepted.
    pub fn from_points(range: DateRange, points: &[RatePoint]) -> (Self, usize) {
        let mut series = Self::empty(range);
        let mut accepted = 0;
        for &(date, rate) in points {
            let Some(idx) = range.index_of(date) else {
                continue;
            };
            if rate.is_finite() && rate > 0.0 {
                series.values[idx] = rate;
                accepted += 1;
            } else {
                log::warn!("Ignoring non-positive rate {} on {}", rate, date);
            }
        }
        (series, accepted)
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn start(&self) -> NaiveDate {
        self.range.start
    }

    pub fn end(&self) -> NaiveDate {
        self.range.end
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw daily values (`NaN` = missing)
    pub fn values(&self) -> &[Rate] {
        &self.values
    }

    /// Value on a date, `None` when outside the range or missing
    pub fn get(&self, date: NaiveDate) -> Option<Rate> {
        self.range
            .index_of(date)
            .map(|i| self.values[i])
            .filter(|v| !v.is_nan())
    }

    /// Number of non-missing observations
    pub fn count_valid(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// First index whose date is on or after `date` (may equal `len()`)
    pub fn position_from(&self, date: NaiveDate) -> usize {
        if date <= self.range.start {
            0
        } else if date > self.range.end {
            self.len()
        } else {
            (date - self.range.start).num_days() as usize
        }
    }

    /// Restrict the series to the days it shares with `[start, end]`.
    ///
    /// Returns `None` when the two ranges do not overlap.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Option<RateSeries> {
        let start = start.max(self.range.start);
        let end = end.min(self.range.end);
        let range = DateRange::new(start, end)?;
        let from = self.position_from(start);
        Some(RateSeries {
            range,
            values: self.values[from..from + range.len()].to_vec(),
        })
    }

    /// Lag the series by `lag_days`: the value at day `d` becomes the value
    /// originally at `d - lag_days`. The first `lag_days` slots are missing.
    pub fn shift(&self, lag_days: usize) -> RateSeries {
        let n = self.values.len();
        let mut shifted = vec![f64::NAN; n];
        if lag_days < n {
            shifted[lag_days..].copy_from_slice(&self.values[..n - lag_days]);
        }
        RateSeries {
            range: self.range,
            values: shifted,
        }
    }

    /// Fill gaps of at most `limit` consecutive missing values.
    ///
    /// Interior gaps are linearly interpolated between the neighbouring
    /// observations. A trailing gap repeats the last observation. Longer gaps
    /// are left untouched in full, and a leading gap is never filled.
    pub fn interpolate_gaps(&self, limit: usize) -> RateSeries {
        let mut values = self.values.clone();
        let n = values.len();
        let mut i = 0;
        while i < n {
            if !values[i].is_nan() {
                i += 1;
                continue;
            }
            let gap_start = i;
            while i < n && values[i].is_nan() {
                i += 1;
            }
            let gap_len = i - gap_start;
            if gap_start == 0 || gap_len > limit {
                continue;
            }
            let left = values[gap_start - 1];
            let right = if i == n { left } else { values[i] };
            let step = (right - left) / (gap_len + 1) as f64;
            for k in 0..gap_len {
                values[gap_start + k] = left + step * (k + 1) as f64;
            }
        }
        RateSeries {
            range: self.range,
            values,
        }
    }

    /// Element-wise ratio `self / other` over an identical date range
    pub fn ratio(&self, other: &RateSeries) -> Result<RateSeries> {
        if self.range != other.range {
            return Err(FxStressError::DataError(format!(
                "Cannot divide series over {}..{} by series over {}..{}",
                self.range.start, self.range.end, other.range.start, other.range.end
            )));
        }
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a / b)
            .collect();
        Ok(RateSeries {
            range: self.range,
            values,
        })
    }
}
