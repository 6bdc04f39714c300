//! External rate sources
//!
//! - Quandl: Bank of England daily spot rates and other datasets
//! - In-memory: pre-loaded observations, for tests and offline runs

#[cfg(feature = "async")]
pub mod quandl;
pub mod in_memory;

#[cfg(feature = "async")]
pub use quandl::QuandlRateSource;
pub use in_memory::InMemoryRateSource;

use super::table::RateTable;
use crate::currency::{CurrencyRecord, CurrencyRegistry, USD_CODE};
use crate::error::{FxStressError, Result};
use crate::types::RatePoint;
use crate::window::EvaluationWindow;
use chrono::NaiveDate;
use std::future::Future;

/// Trait for sources of daily FX series
pub trait RateSource: Send + Sync {
    /// Fetch the daily series for one registry record over `[start, end]`
    fn fetch_series(
        &self,
        record: &CurrencyRecord,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RatePoint>>> + Send;

    /// Get the source name
    fn name(&self) -> &str;
}

/// Download every enabled currency into a table over the window's data range.
///
/// Any failed download aborts the whole run; nothing partial is returned.
/// `on_fetched` is called after each currency with the number of
/// observations that landed in the table.
pub async fn download_rate_table<S, F>(
    source: &S,
    registry: &CurrencyRegistry,
    window: &EvaluationWindow,
    mut on_fetched: F,
) -> Result<RateTable>
where
    S: RateSource,
    F: FnMut(&CurrencyRecord, usize),
{
    let mut table = RateTable::new(window.data_start, window.end_date)?;

    for record in registry.downloadable() {
        if record.code == USD_CODE {
            continue;
        }
        log::info!(
            "Downloading data for {} from {}",
            record.label,
            record.source
        );
        let points = source
            .fetch_series(record, window.data_start, window.end_date)
            .await?;
        let accepted = table.insert_points(&record.code, &points);
        if accepted == 0 {
            log::warn!(
                "{} returned no observations for {} in {}..{}",
                source.name(),
                record.code,
                window.data_start,
                window.end_date
            );
        }
        on_fetched(record, accepted);
    }

    if table.num_columns() == 0 {
        return Err(FxStressError::RegistryError(
            "No enabled currencies to download".to_string(),
        ));
    }
    Ok(table)
}
