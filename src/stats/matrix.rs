//! Pairwise stress matrix over a set of currencies

use super::percentile::LogChangePercentile;
use crate::data::RateTable;
use crate::error::{FxStressError, Result};
use hashbrown::HashMap;

/// Symmetric matrix of pairwise stress statistics.
///
/// Cells hold `None` until written; the diagonal is never written.
/// A computed cell may still hold `NaN` when the pair had no usable data.
#[derive(Debug, Clone)]
pub struct StressMatrix {
    codes: Vec<String>,
    index: HashMap<String, usize>,
    cells: Vec<Option<f64>>,
    lag_days: usize,
}

impl StressMatrix {
    fn empty(codes: Vec<String>, lag_days: usize) -> Self {
        let n = codes.len();
        let index = codes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            codes,
            index,
            cells: vec![None; n * n],
            lag_days,
        }
    }

    fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        let n = self.codes.len();
        self.cells[i * n + j] = Some(value);
        self.cells[j * n + i] = Some(value);
    }

    /// Currency codes on both axes, ascending
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Liquidity horizon (days) the matrix was computed for
    pub fn lag_days(&self) -> usize {
        self.lag_days
    }

    /// Cell by position
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        let n = self.codes.len();
        if row >= n || col >= n {
            return None;
        }
        self.cells[row * n + col]
    }

    /// Cell by currency codes
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = *self.index.get(row)?;
        let j = *self.index.get(col)?;
        self.cell(i, j)
    }

    /// Upper-triangle entries `(row, col, value)` with `row < col`
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        let n = self.codes.len();
        (0..n).flat_map(move |i| {
            ((i + 1)..n).filter_map(move |j| {
                self.cell(i, j)
                    .map(|v| (self.codes[i].as_str(), self.codes[j].as_str(), v))
            })
        })
    }

    /// Build the matrix for `codes` from `table`.
    ///
    /// Codes are sorted and de-duplicated. Each unordered pair is evaluated
    /// once on the cross-rate `table[i] / table[j]` and mirrored.
    pub fn build(table: &RateTable, codes: &[String], stat: &LogChangePercentile) -> Result<Self> {
        let mut codes = codes.to_vec();
        codes.sort();
        codes.dedup();

        if let Some(missing) = codes.iter().find(|c| !table.contains(c)) {
            return Err(FxStressError::MissingCurrency(missing.clone()));
        }

        let mut matrix = Self::empty(codes, stat.lag_days());
        let n = matrix.codes.len();
        for i in 0..n {
            let base = table.series(&matrix.codes[i])?;
            for j in (i + 1)..n {
                let quote = table.series(&matrix.codes[j])?;
                let cross = base.ratio(quote)?;
                let value = stat.compute(&cross);
                log::debug!(
                    "{}/{} over {} days: {}",
                    matrix.codes[i],
                    matrix.codes[j],
                    stat.lag_days(),
                    value
                );
                matrix.set_pair(i, j, value);
            }
        }
        Ok(matrix)
    }
}
