//! Quandl data source integration
//!
//! Fetches daily FX series from Quandl datasets such as the Bank of England
//! `BOE/XUDL*` spot rates.

use super::RateSource;
use crate::currency::CurrencyRecord;
use crate::error::{FxStressError, Result};
use crate::types::RatePoint;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const QUANDL_BASE_URL: &str = "https://www.quandl.com/api/v3";
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Quandl data source
pub struct QuandlRateSource {
    api_key: Option<String>,
    base_url: String,
    client: Client,
    max_retries: u32,
    retry_base_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct QuandlResponse {
    dataset: QuandlDataset,
}

#[derive(Debug, Deserialize)]
struct QuandlDataset {
    data: Vec<Vec<serde_json::Value>>,
    column_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QuandlErrorResponse {
    quandl_error: QuandlErrorBody,
}

#[derive(Debug, Deserialize)]
struct QuandlErrorBody {
    code: String,
    message: String,
}

impl QuandlRateSource {
    /// Create a new Quandl data source
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, QUANDL_BASE_URL)
    }

    /// Create a source pointing at a different API root
    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FxStressError::DataError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            max_retries: MAX_RETRIES,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        })
    }

    /// Override the number of retries after the first failed attempt
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the delay before the first retry; it doubles on each attempt
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    fn dataset_url(&self, dataset: &str, start: NaiveDate, end: NaiveDate) -> String {
        let mut url = format!(
            "{}/datasets/{}.json?start_date={}&end_date={}&collapse=daily",
            self.base_url,
            dataset,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        if let Some(key) = &self.api_key {
            url.push_str("&api_key=");
            url.push_str(key);
        }
        url
    }

    /// Fetch one dataset with exponential backoff between attempts
    pub async fn fetch_dataset(
        &self,
        dataset: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RatePoint>> {
        let url = self.dataset_url(dataset, start, end);

        let mut attempt = 0;
        loop {
            match self.fetch_once(dataset, &url).await {
                Ok(points) => return Ok(points),
                Err(Attempt::Retry(reason)) if attempt < self.max_retries => {
                    let delay = self.retry_base_delay * 2u32.pow(attempt);
                    log::warn!(
                        "Fetching {} failed ({}), retrying in {} ms",
                        dataset,
                        reason,
                        delay.as_millis()
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(Attempt::Retry(reason)) | Err(Attempt::Fatal(reason)) => {
                    return Err(FxStressError::DownloadError {
                        dataset: dataset.to_string(),
                        reason,
                    })
                }
            }
        }
    }

    async fn fetch_once(&self, dataset: &str, url: &str) -> std::result::Result<Vec<RatePoint>, Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Attempt::Retry(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Attempt::Retry(format!("Failed to read body: {}", e)))?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<QuandlErrorResponse>(&body) {
                Ok(err) => format!("{} {}: {}", status, err.quandl_error.code, err.quandl_error.message),
                Err(_) => format!("HTTP {}", status),
            };
            return if is_retryable(status) {
                Err(Attempt::Retry(reason))
            } else {
                Err(Attempt::Fatal(reason))
            };
        }

        let parsed = parse_dataset(&body).map_err(|e| Attempt::Fatal(e.to_string()))?;
        log::debug!("Fetched {} observations for {}", parsed.len(), dataset);
        Ok(parsed)
    }
}

enum Attempt {
    Retry(String),
    Fatal(String),
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Parse a Quandl dataset JSON body into dated rates.
///
/// Uses the `Date` column and the `Value` column, falling back to the first
/// non-date column. Rows with a null value are skipped.
pub fn parse_dataset(body: &str) -> Result<Vec<RatePoint>> {
    let response: QuandlResponse = serde_json::from_str(body)?;
    let columns = &response.dataset.column_names;

    let date_idx = columns
        .iter()
        .position(|n| n.eq_ignore_ascii_case("Date"))
        .ok_or_else(|| FxStressError::DataError("No Date column".to_string()))?;
    let value_idx = columns
        .iter()
        .position(|n| n.eq_ignore_ascii_case("Value"))
        .or_else(|| (0..columns.len()).find(|&i| i != date_idx))
        .ok_or_else(|| FxStressError::DataError("No value column".to_string()))?;

    let mut points = Vec::with_capacity(response.dataset.data.len());
    for row in &response.dataset.data {
        let raw_date = row
            .get(date_idx)
            .and_then(|v| v.as_str())
            .ok_or_else(|| FxStressError::DataError("Invalid date".to_string()))?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| FxStressError::ParseError(format!("Date parse error: {}", e)))?;

        if let Some(value) = row.get(value_idx).and_then(|v| v.as_f64()) {
            points.push((date, value));
        }
    }

    points.sort_by_key(|(date, _)| *date);
    Ok(points)
}

impl RateSource for QuandlRateSource {
    async fn fetch_series(
        &self,
        record: &CurrencyRecord,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RatePoint>> {
        self.fetch_dataset(&record.dataset(), start, end).await
    }

    fn name(&self) -> &str {
        "quandl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const DATASET_BODY: &str = r#"{"dataset": {
        "column_names": ["Date", "Value"],
        "data": [["2024-01-02", 1.2690], ["2024-01-03", 1.2705]]
    }}"#;

    const NOT_FOUND_BODY: &str =
        r#"{"quandl_error": {"code": "QECx02", "message": "You have submitted an incorrect Quandl code."}}"#;

    /// Serve one canned response per connection, counting requests
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while read < buf.len() {
                    let n = socket.read(&mut buf[read..]).await.unwrap();
                    read += n;
                    if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);

                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn source(base_url: &str) -> QuandlRateSource {
        QuandlRateSource::with_base_url(Some("k".to_string()), base_url)
            .unwrap()
            .with_retry_delay(Duration::from_millis(5))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_retries_server_error() {
        let (url, hits) = serve(vec![(500, "{}"), (200, DATASET_BODY)]).await;
        let points = source(&url)
            .fetch_dataset("BOE/XUDLGBD", d(2024, 1, 1), d(2024, 1, 31))
            .await
            .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], (d(2024, 1, 2), 1.2690));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_client_error_is_fatal() {
        let (url, hits) = serve(vec![(404, NOT_FOUND_BODY)]).await;
        let result = source(&url)
            .fetch_dataset("BOE/NOPE", d(2024, 1, 1), d(2024, 1, 31))
            .await;
        match result {
            Err(FxStressError::DownloadError { dataset, reason }) => {
                assert_eq!(dataset, "BOE/NOPE");
                assert!(reason.contains("QECx02"), "reason: {}", reason);
            }
            other => panic!("expected DownloadError, got {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_retries() {
        let (url, hits) = serve(vec![(503, "{}"), (429, "{}"), (500, "{}")]).await;
        let result = source(&url)
            .with_max_retries(2)
            .fetch_dataset("BOE/XUDLGBD", d(2024, 1, 1), d(2024, 1, 31))
            .await;
        assert!(matches!(result, Err(FxStressError::DownloadError { .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_quandl_source_creation() {
        let source = QuandlRateSource::new(Some("test_key".to_string()));
        assert!(source.is_ok());
        assert_eq!(source.unwrap().name(), "quandl");
    }

    #[test]
    fn test_dataset_url() {
        let source = QuandlRateSource::with_base_url(Some("k".to_string()), "http://localhost/api/").unwrap();
        let url = source.dataset_url(
            "BOE/XUDLGBD",
            NaiveDate::from_ymd_opt(2015, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
        );
        assert_eq!(
            url,
            "http://localhost/api/datasets/BOE/XUDLGBD.json?start_date=2015-10-01&end_date=2026-09-30&collapse=daily&api_key=k"
        );

        let anonymous = QuandlRateSource::new(None).unwrap();
        let url = anonymous.dataset_url(
            "BOE/XUDLGBD",
            NaiveDate::from_ymd_opt(2015, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
        );
        assert!(!url.contains("api_key"));
    }

    #[test]
    fn test_parse_dataset() {
        let body = r#"{"dataset": {
            "column_names": ["Date", "Value"],
            "data": [["2024-01-03", 1.2705], ["2024-01-02", 1.2690], ["2024-01-04", null]]
        }}"#;
        let points = parse_dataset(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 1.2690));
        assert_eq!(points[1].1, 1.2705);
    }

    #[test]
    fn test_parse_dataset_falls_back_to_first_value_column() {
        let body = r#"{"dataset": {
            "column_names": ["Date", "Rate"],
            "data": [["2024-01-02", 0.79]]
        }}"#;
        let points = parse_dataset(body).unwrap();
        assert_eq!(points[0].1, 0.79);
    }

    #[test]
    fn test_parse_dataset_without_date_fails() {
        let body = r#"{"dataset": {"column_names": ["Value"], "data": [[1.0]]}}"#;
        assert!(parse_dataset(body).is_err());
    }

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }
}
