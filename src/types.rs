//! Core types and constants

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Exchange rate type: price of one unit of a currency in USD
pub type Rate = f64;

/// A single dated observation returned by a data source
pub type RatePoint = (NaiveDate, Rate);

/// Contiguous, inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new range; `None` when `end` is before `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if end < start {
            None
        } else {
            Some(Self { start, end })
        }
    }

    /// Number of calendar days in the range
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check whether a date falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Position of a date in the daily index
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if self.contains(date) {
            Some((date - self.start).num_days() as usize)
        } else {
            None
        }
    }

    /// Date at a position in the daily index
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// Iterate every calendar day in the range
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.len()).map(move |i| self.date_at(i))
    }
}
