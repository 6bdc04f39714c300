//! In-memory rate source keyed by dataset path

use super::RateSource;
use crate::currency::CurrencyRecord;
use crate::error::{FxStressError, Result};
use crate::types::RatePoint;
use chrono::NaiveDate;
use hashbrown::HashMap;

/// Rate source serving pre-loaded observations.
///
/// Datasets are keyed like registry records, e.g. `"BOE/XUDLGBD"`.
/// Unknown datasets fail the same way a failed download does.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateSource {
    datasets: HashMap<String, Vec<RatePoint>>,
}

impl InMemoryRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register observations for a dataset, replacing any previous ones
    pub fn add_points(&mut self, dataset: &str, mut points: Vec<RatePoint>) {
        points.sort_by_key(|(date, _)| *date);
        self.datasets.insert(dataset.to_string(), points);
    }
}

impl RateSource for InMemoryRateSource {
    async fn fetch_series(
        &self,
        record: &CurrencyRecord,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RatePoint>> {
        let dataset = record.dataset();
        let points = self
            .datasets
            .get(&dataset)
            .ok_or_else(|| FxStressError::DownloadError {
                dataset: dataset.clone(),
                reason: "dataset not available".to_string(),
            })?;
        Ok(points
            .iter()
            .copied()
            .filter(|(date, _)| *date >= start && *date <= end)
            .collect())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
