//! fx-stress CLI - historical FX stress matrices from the command line
//!
//! ## Example Usage
//!
//! ```bash
//! # Download rates (or reuse the cache) and write one matrix per horizon
//! fx-stress run --registry quandl_BOE_FX_codes.csv --output-dir results
//!
//! # Ignore the cache and download fresh rates before computing
//! fx-stress run --refresh
//!
//! # Only download rates and rewrite the cache
//! fx-stress download
//!
//! # Show the resolved configuration and evaluation window
//! fx-stress info
//! ```

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use fx_stress::config::StressConfig;
use fx_stress::currency::CurrencyRegistry;
use fx_stress::data::cache::{load_for_window, write_gz_csv};
use fx_stress::data::sources::{download_rate_table, QuandlRateSource};
use fx_stress::data::RateTable;
use fx_stress::engine::StressEngine;
use fx_stress::window::{horizons_for, EvaluationWindow};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

/// fx-stress: percentile stress of FX cross-rates over liquidity horizons
#[derive(Parser)]
#[command(name = "fx-stress")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Historical FX stress matrices per liquidity horizon", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load or download rates, compute every horizon and write the matrices
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Ignore an existing cache and download fresh data
        #[arg(long)]
        refresh: bool,

        /// Directory receiving the result CSVs
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Percentile of absolute log-changes (0-100)
        #[arg(short = 'p', long)]
        percentile: Option<f64>,

        /// Liquidity horizons in months, comma separated
        #[arg(long, value_delimiter = ',')]
        horizons: Option<Vec<u32>>,
    },

    /// Download rates and write the cache only
    Download {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Show the resolved configuration, window and horizons
    Info,
}

#[derive(Args)]
struct DataArgs {
    /// Currency registry CSV (Label,Code,Source,Quandl_Code,Enabled)
    #[arg(short = 'r', long)]
    registry: Option<PathBuf>,

    /// Gzip CSV rate cache
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Evaluation end date (YYYY-MM-DD) instead of the last quarter-end
    #[arg(short = 'e', long)]
    end_date: Option<NaiveDate>,
}

impl DataArgs {
    fn apply(&self, config: &mut StressConfig) {
        if let Some(registry) = &self.registry {
            config.registry_path = registry.clone();
        }
        if let Some(cache) = &self.cache {
            config.cache_path = Some(cache.clone());
        }
        if self.end_date.is_some() {
            config.end_date = self.end_date;
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".fx-stress").join("config.toml"))
}

fn load_config(path: Option<&Path>) -> StressConfig {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return StressConfig::default(),
        },
    };

    if !path.exists() {
        if explicit {
            eprintln!(
                "{} Config file not found: {}",
                "Warning:".yellow(),
                path.display()
            );
        }
        return StressConfig::default();
    }

    match fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                StressConfig::default()
            }
        },
        Err(e) => {
            eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
            StressConfig::default()
        }
    }
}

fn resolve_window(config: &StressConfig) -> fx_stress::error::Result<EvaluationWindow> {
    match config.end_date {
        Some(end) => EvaluationWindow::ending_at(end, config.lookback_years, config.data_lookback_days),
        None => EvaluationWindow::from_today(
            Local::now().date_naive(),
            config.lookback_years,
            config.data_lookback_days,
        ),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref());

    if cli.verbose {
        println!(
            "{} v{}",
            "fx-stress".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
    }

    let result = match cli.command {
        Commands::Run {
            data,
            refresh,
            output_dir,
            percentile,
            horizons,
        } => {
            data.apply(&mut config);
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(p) = percentile {
                config.percentile = p;
            }
            if let Some(h) = horizons {
                config.liquidity_horizons_months = h;
            }
            run_stress(&config, refresh, cli.verbose)
        }
        Commands::Download { data } => {
            data.apply(&mut config);
            download_only(&config)
        }
        Commands::Info => show_info(&config),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Download every enabled currency with a progress bar
fn download(
    config: &StressConfig,
    registry: &CurrencyRegistry,
    window: &EvaluationWindow,
) -> Result<RateTable, Box<dyn std::error::Error>> {
    let api_key = config.source.resolved_api_key();
    if api_key.is_none() {
        log::warn!("No API key configured; requests are anonymous and rate limited");
    }
    let source = QuandlRateSource::with_base_url(api_key, &config.source.base_url)?;

    let pb = ProgressBar::new(registry.downloadable().count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓▒░ "),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let table = runtime.block_on(download_rate_table(&source, registry, window, |record, count| {
        pb.set_message(format!("{} ({} obs)", record.code, count));
        pb.inc(1);
    }));
    match table {
        Ok(table) => {
            pb.finish_with_message("Download complete");
            Ok(table)
        }
        Err(e) => {
            pb.abandon_with_message("Download failed");
            Err(e.into())
        }
    }
}

/// Load the cached table when allowed and usable, otherwise download it
fn load_or_download(
    config: &StressConfig,
    registry: &CurrencyRegistry,
    window: &EvaluationWindow,
    refresh: bool,
) -> Result<RateTable, Box<dyn std::error::Error>> {
    if let Some(cache) = config.cache_path.as_deref() {
        if !refresh {
            if let Some(table) = load_for_window(cache, registry, window)? {
                println!("  {} {}", "Using cache:".bold(), cache.display());
                return Ok(table);
            }
        }
    }

    let table = download(config, registry, window)?;
    if let Some(cache) = config.cache_path.as_deref() {
        write_gz_csv(cache, &table)?;
    }
    Ok(table)
}

fn run_stress(config: &StressConfig, refresh: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "Computing FX stress matrices...".cyan().bold());
    println!();

    config.validate()?;
    let window = resolve_window(config)?;
    let registry = CurrencyRegistry::from_path(&config.registry_path)?.with_usd();
    let engine = StressEngine::new(config, window)?;

    if verbose {
        println!("  {} {}", "Registry:".bold(), config.registry_path.display());
        println!("  {} {}", "Window:".bold(), window);
        println!("  {} {}", "Percentile:".bold(), config.percentile);
        println!("  {} {}", "Currencies:".bold(), registry.enabled_codes().join(", "));
        println!();
    }

    let start = Instant::now();
    let table = load_or_download(config, &registry, &window, refresh)?;
    let table = engine.prepare_table(table, &registry);

    let results = engine.run(&table, &registry)?;
    let paths = StressEngine::write_all(&results, &config.output_dir, &config.output_prefix)?;

    println!();
    println!("{}", "Stress Summary".green().bold());
    println!("{}", "==============".green());
    for (result, path) in results.iter().zip(paths.iter()) {
        println!("  {} {}", format!("{:>4}M", result.horizon.months).bold(), result.summary);
        println!("        {}", path.display().to_string().dimmed());
    }
    println!();
    println!(
        "{} Done in {:.2}s",
        "✓".green().bold(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn download_only(config: &StressConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cache = config
        .cache_path
        .as_deref()
        .ok_or("No cache_path configured; nothing to write")?;
    let window = resolve_window(config)?;
    let registry = CurrencyRegistry::from_path(&config.registry_path)?;

    println!(
        "{}",
        format!("Downloading {} currencies", registry.downloadable().count())
            .cyan()
            .bold()
    );
    println!("  {} {} to {}", "Range:".bold(), window.data_start, window.end_date);
    println!();

    let table = download(config, &registry, &window)?;
    write_gz_csv(cache, &table)?;

    println!(
        "{} Cached {} currencies to {}",
        "✓".green().bold(),
        table.num_columns(),
        cache.display()
    );
    Ok(())
}

fn show_info(config: &StressConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} {}",
        "fx-stress".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();

    println!("{}", "Configuration".bold());
    println!("{}", "=============".dimmed());
    println!("  {} {}", "Registry:".bold(), config.registry_path.display());
    match &config.cache_path {
        Some(cache) => println!("  {} {}", "Cache:".bold(), cache.display()),
        None => println!("  {} {}", "Cache:".bold(), "disabled".dimmed()),
    }
    println!("  {} {}", "Output directory:".bold(), config.output_dir.display());
    println!("  {} {}", "Output prefix:".bold(), config.output_prefix);
    println!("  {} {}", "Data source:".bold(), config.source.base_url);
    println!(
        "  {} {}",
        "API key:".bold(),
        if config.source.resolved_api_key().is_some() {
            "set".green()
        } else {
            "not set".red()
        }
    );
    println!();

    config.validate()?;
    let window = resolve_window(config)?;
    println!("{}", "Evaluation".bold());
    println!("{}", "==========".dimmed());
    println!("  {} {}", "Lookback:".bold(), format!("{} years", config.lookback_years));
    println!("  {} {}", "Window:".bold(), window);
    println!("  {} {}", "Percentile:".bold(), config.percentile);
    println!(
        "  {} {} days",
        "Gap limit:".bold(),
        config.interpolation_gap_limit_days
    );
    let horizons = horizons_for(&config.liquidity_horizons_months, &window)?;
    for horizon in horizons {
        println!("  {} {}", "Horizon:".bold(), horizon);
    }
    println!();

    Ok(())
}
