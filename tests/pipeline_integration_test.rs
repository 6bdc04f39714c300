//! End-to-end tests: registry -> source -> cache -> engine -> CSV files

use chrono::{Datelike, NaiveDate};
use fx_stress::config::StressConfig;
use fx_stress::currency::{CurrencyRegistry, USD_CODE};
use fx_stress::data::cache::{read_gz_csv, write_gz_csv};
use fx_stress::data::{download_rate_table, InMemoryRateSource};
use fx_stress::engine::StressEngine;
use fx_stress::window::EvaluationWindow;
use tempfile::tempdir;

const REGISTRY_CSV: &str = "\
Label,Code,Source,Quandl_Code,Enabled
Euro,EUR,BOE,XUDLERD,1
Sterling,GBP,BOE,XUDLGBD,1
Japanese yen,JPY,BOE,XUDLJYD,0
Swiss franc,CHF,BOE,XUDLSFD,1
";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekday-only observations following a smooth path
fn business_days(window: &EvaluationWindow, level: f64, period: f64) -> Vec<(NaiveDate, f64)> {
    let mut points = Vec::new();
    let mut date = window.data_start;
    let mut i = 0.0;
    while date <= window.end_date {
        if date.weekday().num_days_from_monday() < 5 {
            points.push((date, level * (1.0 + 0.05 * (i / period).sin())));
        }
        date = date.succ_opt().unwrap();
        i += 1.0;
    }
    points
}

fn source_for(window: &EvaluationWindow) -> InMemoryRateSource {
    let mut source = InMemoryRateSource::new();
    source.add_points("BOE/XUDLERD", business_days(window, 1.1, 19.0));
    source.add_points("BOE/XUDLGBD", business_days(window, 1.3, 31.0));
    source.add_points("BOE/XUDLSFD", business_days(window, 1.1, 19.0));
    source
}

#[tokio::test]
async fn test_full_pipeline_with_cache() {
    let config = StressConfig {
        lookback_years: 2,
        end_date: Some(d(2025, 12, 31)),
        ..StressConfig::default()
    };
    let window = EvaluationWindow::ending_at(d(2025, 12, 31), 2, 366).unwrap();
    let registry = CurrencyRegistry::from_reader(REGISTRY_CSV.as_bytes())
        .unwrap()
        .with_usd();

    let source = source_for(&window);
    let table = download_rate_table(&source, &registry, &window, |_, _| {})
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    let cache = dir.path().join("rates.csv.gz");
    write_gz_csv(&cache, &table).unwrap();
    let cached = read_gz_csv(&cache).unwrap();
    assert!(cached.covers(window.data_start, window.end_date));

    let engine = StressEngine::new(&config, window).unwrap();
    let cached = engine.prepare_table(cached, &registry);
    assert!(cached.contains(USD_CODE));

    let results = engine.run(&cached, &registry).unwrap();
    assert_eq!(results.len(), 5);

    for result in &results {
        let m = &result.matrix;
        assert_eq!(m.codes(), &["CHF", "EUR", "GBP", "USD"]);
        assert_eq!(m.get("JPY", "EUR"), None);
        // CHF and EUR follow the same path
        assert_eq!(m.get("CHF", "EUR"), Some(0.0));
        let gbp_usd = m.get("GBP", "USD").unwrap();
        assert!(gbp_usd > 0.0 && gbp_usd < 0.25);
        assert_eq!(m.get("GBP", "USD"), m.get("USD", "GBP"));
        assert_eq!(result.summary.pairs, 6);
    }

    // Longer horizons see larger moves on a smooth oscillation
    let one_month = results[0].matrix.get("GBP", "USD").unwrap();
    let three_month = results[1].matrix.get("GBP", "USD").unwrap();
    assert!(three_month > one_month);

    let out = dir.path().join("out");
    let paths = StressEngine::write_all(&results, &out, &config.output_prefix).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "quandl_FX_stress_30_day.csv",
            "quandl_FX_stress_91_day.csv",
            "quandl_FX_stress_182_day.csv",
            "quandl_FX_stress_273_day.csv",
            "quandl_FX_stress_365_day.csv",
        ]
    );

    let text = std::fs::read_to_string(&paths[0]).unwrap();
    assert!(text.starts_with(",CHF,EUR,GBP,USD"));
    assert!(text.lines().nth(1).unwrap().starts_with("CHF,,0,"));
}

#[tokio::test]
async fn test_missing_dataset_aborts_download() {
    let window = EvaluationWindow::ending_at(d(2025, 12, 31), 1, 366).unwrap();
    let registry = CurrencyRegistry::from_reader(REGISTRY_CSV.as_bytes()).unwrap();
    let mut source = InMemoryRateSource::new();
    source.add_points("BOE/XUDLERD", business_days(&window, 1.1, 19.0));

    let result = download_rate_table(&source, &registry, &window, |_, _| {}).await;
    assert!(result.is_err());
}

#[test]
fn test_short_history_degrades_to_nan() {
    let config = StressConfig {
        lookback_years: 1,
        liquidity_horizons_months: vec![12],
        ..StressConfig::default()
    };
    // No data before the evaluation window at all
    let window = EvaluationWindow::ending_at(d(2025, 12, 31), 1, 0).unwrap();
    let registry = CurrencyRegistry::from_reader(REGISTRY_CSV.as_bytes()).unwrap();
    let mut table = fx_stress::data::RateTable::new(window.data_start, window.end_date).unwrap();
    for code in ["EUR", "GBP"] {
        table.insert_points(code, &business_days(&window, 1.2, 17.0)[..100]);
    }
    table.insert_points("CHF", &business_days(&window, 1.0, 23.0));

    let engine = StressEngine::new(&config, window).unwrap();
    let results = engine.run(&table, &registry).unwrap();
    let m = &results[0].matrix;
    assert!(m.get("EUR", "GBP").unwrap().is_nan());
    assert_eq!(results[0].summary.undefined_pairs, 3);
}
