//! Gzip-compressed CSV cache of downloaded rate tables
//!
//! Layout: a `date` column followed by one `{CODE}USD` column per currency,
//! one row per calendar day. Empty cells are missing observations.

use super::table::RateTable;
use crate::currency::{CurrencyRegistry, USD_CODE};
use crate::error::{FxStressError, Result};
use crate::types::RatePoint;
use crate::window::EvaluationWindow;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const DATE_COLUMN: &str = "date";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Write a rate table to a gzip CSV file.
///
/// The synthetic USD column is not persisted; it is re-added on load.
pub fn write_gz_csv(path: &Path, table: &RateTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut wtr = WriterBuilder::new().from_writer(encoder);

    let columns: Vec<(&str, &[f64])> = table
        .iter()
        .filter(|(code, _)| *code != USD_CODE)
        .map(|(code, series)| (code, series.values()))
        .collect();

    let mut header = vec![DATE_COLUMN.to_string()];
    header.extend(columns.iter().map(|(code, _)| format!("{}{}", code, USD_CODE)));
    wtr.write_record(&header)?;

    for (i, date) in table.range().days().enumerate() {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(date.format(DATE_FORMAT).to_string());
        for (_, values) in &columns {
            let v = values[i];
            row.push(if v.is_nan() { String::new() } else { v.to_string() });
        }
        wtr.write_record(&row)?;
    }

    let encoder = wtr
        .into_inner()
        .map_err(|e| FxStressError::DataError(format!("Failed to flush cache: {}", e)))?;
    encoder.finish()?.flush()?;

    log::info!(
        "Cached {} currencies over {} days to {}",
        columns.len(),
        table.num_days(),
        path.display()
    );
    Ok(())
}

/// Read a rate table previously written by [`write_gz_csv`]
pub fn read_gz_csv(path: &Path) -> Result<RateTable> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut rdr = ReaderBuilder::new().from_reader(decoder);

    let headers = rdr.headers()?.clone();
    if headers.get(0) != Some(DATE_COLUMN) {
        return Err(FxStressError::ParseError(format!(
            "Cache {} must start with a '{}' column",
            path.display(),
            DATE_COLUMN
        )));
    }

    let mut codes = Vec::with_capacity(headers.len().saturating_sub(1));
    for name in headers.iter().skip(1) {
        let code = name.strip_suffix(USD_CODE).filter(|c| !c.is_empty()).ok_or_else(|| {
            FxStressError::ParseError(format!("Unexpected cache column '{}'", name))
        })?;
        codes.push(code.to_string());
    }

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut points: Vec<Vec<RatePoint>> = vec![Vec::new(); codes.len()];

    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            FxStressError::ParseError(format!("Invalid date '{}' on row {}: {}", raw_date, line + 2, e))
        })?;
        dates.push(date);

        for (col, cell) in record.iter().skip(1).enumerate().take(codes.len()) {
            let cell = cell.trim();
            if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                continue;
            }
            let value: f64 = cell.parse().map_err(|e| {
                FxStressError::ParseError(format!(
                    "Invalid rate '{}' for {} on {}: {}",
                    cell, codes[col], date, e
                ))
            })?;
            points[col].push((date, value));
        }
    }

    let (start, end) = match (dates.iter().min(), dates.iter().max()) {
        (Some(&start), Some(&end)) => (start, end),
        _ => {
            return Err(FxStressError::DataError(format!(
                "Cache {} contains no rows",
                path.display()
            )))
        }
    };

    let mut table = RateTable::new(start, end)?;
    for (code, pts) in codes.iter().zip(points.iter()) {
        table.insert_points(code, pts);
    }

    log::info!(
        "Loaded {} cached currencies ({} to {}) from {}",
        codes.len(),
        start,
        end,
        path.display()
    );
    Ok(table)
}

/// Check that a cached table can serve a run over `window`.
///
/// Every downloadable registry currency must be present and the index must
/// span `[data_start, end_date]`. A longer index is fine; callers trim it.
pub fn is_usable(table: &RateTable, registry: &CurrencyRegistry, window: &EvaluationWindow) -> bool {
    let missing: Vec<&str> = registry
        .downloadable()
        .map(|r| r.code.as_str())
        .filter(|code| !table.contains(code))
        .collect();
    if !missing.is_empty() {
        log::debug!("Cache lacks {:?}", missing);
        return false;
    }
    if !table.covers(window.data_start, window.end_date) {
        log::debug!(
            "Cache spans {}..{}, window needs {}..{}",
            table.range().start,
            table.range().end,
            window.data_start,
            window.end_date
        );
        return false;
    }
    true
}

/// Load the cache at `path` trimmed to the window's data range.
///
/// Returns `None` when the file is absent or [`is_usable`] rejects it.
pub fn load_for_window(
    path: &Path,
    registry: &CurrencyRegistry,
    window: &EvaluationWindow,
) -> Result<Option<RateTable>> {
    if !path.exists() {
        return Ok(None);
    }
    let table = read_gz_csv(path)?;
    if !is_usable(&table, registry, window) {
        log::warn!("Cache {} is stale for window {}", path.display(), window);
        return Ok(None);
    }
    Ok(Some(table.slice(window.data_start, window.end_date)?))
}
