//! Rate table: one daily series per currency on a shared date index

use super::series::RateSeries;
use crate::error::{FxStressError, Result};
use crate::types::{DateRange, Rate, RatePoint};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Mapping from currency code to a daily [`RateSeries`], all sharing one index.
///
/// Codes are kept in a `BTreeMap` so iteration is always lexicographic.
#[derive(Debug, Clone)]
pub struct RateTable {
    range: DateRange,
    columns: BTreeMap<String, RateSeries>,
}

impl RateTable {
    /// Create an empty table covering `[start, end]`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = DateRange::new(start, end).ok_or_else(|| {
            FxStressError::InvalidParameter(format!(
                "Rate table end {} is before start {}",
                end, start
            ))
        })?;
        Ok(Self {
            range,
            columns: BTreeMap::new(),
        })
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Number of calendar days in the index
    pub fn num_days(&self) -> usize {
        self.range.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Left-join sparse observations onto the daily index.
    ///
    /// Returns the number of observations that landed in the index.
    pub fn insert_points(&mut self, code: &str, points: &[RatePoint]) -> usize {
        let (series, accepted) = RateSeries::from_points(self.range, points);
        self.columns.insert(code.to_string(), series);
        accepted
    }

    /// Insert a fully built series; it must span the table's index exactly
    pub fn insert_series(&mut self, code: &str, series: RateSeries) -> Result<()> {
        if series.range() != self.range {
            return Err(FxStressError::DataError(format!(
                "Series for {} spans {}..{}, table spans {}..{}",
                code,
                series.start(),
                series.end(),
                self.range.start,
                self.range.end
            )));
        }
        self.columns.insert(code.to_string(), series);
        Ok(())
    }

    /// Return a new table with an extra constant column (e.g. USD at 1.0)
    pub fn with_constant(mut self, code: &str, value: Rate) -> Self {
        self.columns
            .insert(code.to_string(), RateSeries::constant(self.range, value));
        self
    }

    pub fn contains(&self, code: &str) -> bool {
        self.columns.contains_key(code)
    }

    /// Series for a currency code
    pub fn series(&self, code: &str) -> Result<&RateSeries> {
        self.columns
            .get(code)
            .ok_or_else(|| FxStressError::MissingCurrency(code.to_string()))
    }

    /// Implied cross-rate series `table[base] / table[quote]`
    pub fn cross_rate(&self, base: &str, quote: &str) -> Result<RateSeries> {
        self.series(base)?.ratio(self.series(quote)?)
    }

    /// Column codes in lexicographic order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Iterate `(code, series)` in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RateSeries)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of non-missing observations for a code
    pub fn coverage(&self, code: &str) -> Result<usize> {
        Ok(self.series(code)?.count_valid())
    }

    /// Restrict every column to `[start, end]`.
    ///
    /// Fails when the requested range does not overlap the table's index.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Result<RateTable> {
        let range = DateRange::new(start.max(self.range.start), end.min(self.range.end))
            .ok_or_else(|| {
                FxStressError::DataError(format!(
                    "Range {}..{} lies outside table {}..{}",
                    start, end, self.range.start, self.range.end
                ))
            })?;
        let mut columns = BTreeMap::new();
        for (code, series) in &self.columns {
            if let Some(clipped) = series.clip(range.start, range.end) {
                columns.insert(code.clone(), clipped);
            }
        }
        Ok(RateTable { range, columns })
    }

    /// Check that the index spans at least `[start, end]`
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.range.start <= start && self.range.end >= end
    }
}
