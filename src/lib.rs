//! # fx-stress
//!
//! Historical FX stress statistics.
//!
//! For every pair of currencies, fx-stress computes a high percentile of the
//! absolute log-change of the cross-rate over a liquidity horizon (1, 3, 6,
//! 9 and 12 months by default) across a multi-year lookback window. Daily
//! rates are downloaded from Quandl, aligned on a calendar-day index and
//! emitted as one symmetric CSV matrix per horizon.
//!
//! ## Example
//!
//! ```rust
//! use fx_stress::prelude::*;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//! let table = RateTable::new(start, end)
//!     .unwrap()
//!     .with_constant("EUR", 1.1)
//!     .with_constant("USD", 1.0);
//!
//! let eval_start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let stat = LogChangePercentile::new(30, 95.0, eval_start).unwrap();
//! let codes = vec!["EUR".to_string(), "USD".to_string()];
//! let matrix = StressMatrix::build(&table, &codes, &stat).unwrap();
//!
//! assert_eq!(matrix.get("EUR", "USD"), Some(0.0));
//! assert_eq!(matrix.get("EUR", "EUR"), None);
//! ```

pub mod config;
pub mod currency;
pub mod data;
pub mod engine;
pub mod error;
pub mod report;
pub mod stats;
pub mod types;
pub mod window;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::{SourceConfig, StressConfig};
    pub use crate::currency::{CurrencyRecord, CurrencyRegistry, USD_CODE};
    pub use crate::data::{RateSeries, RateSource, RateTable};
    pub use crate::engine::{HorizonResult, StressEngine};
    pub use crate::error::{FxStressError, Result};
    pub use crate::report::MatrixSummary;
    pub use crate::stats::{LogChangePercentile, StressMatrix};
    pub use crate::types::*;
    pub use crate::window::{EvaluationWindow, LiquidityHorizon};
}
