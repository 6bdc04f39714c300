//! Rate data handling
//!
//! # Components
//!
//! - **series**: dense daily rate series with lagging and gap interpolation
//! - **table**: currency code to series mapping on a shared daily index
//! - **cache**: gzip CSV persistence of downloaded tables
//! - **sources**: external rate providers (Quandl) and the download loop
//!
//! # Example
//!
//! ```rust
//! use fx_stress::data::RateTable;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
//! let table = RateTable::new(start, end)
//!     .unwrap()
//!     .with_constant("EUR", 1.1)
//!     .with_constant("GBP", 1.3);
//!
//! let cross = table.cross_rate("EUR", "GBP").unwrap();
//! assert_eq!(cross.get(start), Some(1.1 / 1.3));
//! ```

pub mod cache;
pub mod series;
pub mod sources;
pub mod table;

pub use series::RateSeries;
pub use sources::{download_rate_table, InMemoryRateSource, RateSource};
pub use table::RateTable;
