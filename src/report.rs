//! Writing stress matrices and summarising them

use crate::error::{FxStressError, Result};
use crate::stats::StressMatrix;
use csv::WriterBuilder;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Min, OrderStatistics};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result file for one horizon: `{dir}/{prefix}_{days}_day.csv`
pub fn output_path(dir: &Path, prefix: &str, lag_days: usize) -> PathBuf {
    dir.join(format!("{}_{}_day.csv", prefix, lag_days))
}

/// Write a matrix as CSV with codes as both row and column headers.
///
/// Diagonal and undefined cells are written as empty strings.
pub fn write_matrix<W: Write>(writer: W, matrix: &StressMatrix) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = Vec::with_capacity(matrix.len() + 1);
    header.push(String::new());
    header.extend(matrix.codes().iter().cloned());
    wtr.write_record(&header)?;

    for (i, code) in matrix.codes().iter().enumerate() {
        let mut row = Vec::with_capacity(matrix.len() + 1);
        row.push(code.clone());
        for j in 0..matrix.len() {
            row.push(match matrix.cell(i, j) {
                Some(v) if !v.is_nan() => v.to_string(),
                _ => String::new(),
            });
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write a matrix to a CSV file, creating parent directories
pub fn write_matrix_csv(path: &Path, matrix: &StressMatrix) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path).map_err(|e| {
        FxStressError::DataError(format!("Cannot create {}: {}", path.display(), e))
    })?;
    write_matrix(file, matrix)
}

/// Summary statistics over the off-diagonal pairs of a matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixSummary {
    pub lag_days: usize,
    pub currencies: usize,
    pub pairs: usize,
    pub undefined_pairs: usize,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

impl MatrixSummary {
    pub fn from_matrix(matrix: &StressMatrix) -> Self {
        let all: Vec<f64> = matrix.pairs().map(|(_, _, v)| v).collect();
        let defined: Vec<f64> = all.iter().copied().filter(|v| !v.is_nan()).collect();
        let undefined_pairs = all.len() - defined.len();

        let (min, median, mean, max) = if defined.is_empty() {
            (None, None, None, None)
        } else {
            let mut data = Data::new(defined);
            (
                Some(data.min()),
                Some(data.median()),
                data.mean(),
                Some(data.max()),
            )
        };

        Self {
            lag_days: matrix.lag_days(),
            currencies: matrix.len(),
            pairs: all.len(),
            undefined_pairs,
            min,
            median,
            mean,
            max,
        }
    }
}

impl fmt::Display for MatrixSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |v: Option<f64>| match v {
            Some(v) => format!("{:.2}%", v * 100.0),
            None => "n/a".to_string(),
        };
        write!(
            f,
            "{} days: {} currencies, {} pairs ({} undefined), min {}, median {}, mean {}, max {}",
            self.lag_days,
            self.currencies,
            self.pairs,
            self.undefined_pairs,
            pct(self.min),
            pct(self.median),
            pct(self.mean),
            pct(self.max)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RateTable;
    use crate::stats::LogChangePercentile;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_matrix() -> StressMatrix {
        let mut table = RateTable::new(d(2023, 1, 1), d(2023, 12, 31)).unwrap();
        let n = table.num_days();
        let gbp: Vec<_> = (0..n)
            .map(|i| (table.range().date_at(i), 1.25 + (i as f64 / 11.0).sin() * 0.03))
            .collect();
        table.insert_points("GBP", &gbp);
        table.insert_points("XAU", &[]);
        let table = table.with_constant("USD", 1.0);
        let stat = LogChangePercentile::new(30, 95.0, d(2023, 6, 1)).unwrap();
        let codes = vec!["GBP".to_string(), "USD".to_string(), "XAU".to_string()];
        StressMatrix::build(&table, &codes, &stat).unwrap()
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("/tmp/out"), "quandl_FX_stress", 91);
        assert_eq!(path, PathBuf::from("/tmp/out/quandl_FX_stress_91_day.csv"));
    }

    #[test]
    fn test_write_matrix_layout() {
        let matrix = sample_matrix();
        let mut buf = Vec::new();
        write_matrix(&mut buf, &matrix).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], ",GBP,USD,XAU");
        assert_eq!(lines.len(), 4);
        // GBP row: empty diagonal, defined GBP/USD, undefined GBP/XAU
        let gbp: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(gbp[0], "GBP");
        assert_eq!(gbp[1], "");
        assert!(gbp[2].parse::<f64>().unwrap() > 0.0);
        assert_eq!(gbp[3], "");
        // Symmetric: USD row, GBP column
        let usd: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(usd[1], gbp[2]);
    }

    #[test]
    fn test_write_matrix_csv_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = output_path(&dir.path().join("nested"), "fx", 30);
        write_matrix_csv(&path, &sample_matrix()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_summary() {
        let summary = MatrixSummary::from_matrix(&sample_matrix());
        assert_eq!(summary.currencies, 3);
        assert_eq!(summary.pairs, 3);
        assert_eq!(summary.undefined_pairs, 2);
        assert_eq!(summary.min, summary.max);
        assert!(summary.mean.unwrap() > 0.0);
        assert!(summary.to_string().contains("30 days"));
    }
}
