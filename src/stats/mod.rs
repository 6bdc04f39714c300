//! Stress statistics
//!
//! - **percentile**: percentile of absolute log-changes of one series over a lag
//! - **matrix**: the symmetric pairwise matrix of that statistic over cross-rates

pub mod matrix;
pub mod percentile;

pub use matrix::StressMatrix;
pub use percentile::{
    abs_ln_change_percentile, abs_log_changes, nan_percentile, LogChangePercentile,
    DEFAULT_GAP_LIMIT,
};
