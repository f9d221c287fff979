//! Performance analytics over journal trades.
//!
//! Every function here is a pure read over a trade slice: nothing is sorted in
//! place, nothing is cached, and missing data degrades to `None` or an empty
//! list instead of an error.

pub mod config;
pub mod filter;
pub mod grouping;
pub mod psychology;
pub mod report;
pub mod stats;
pub mod targets;

pub use config::AnalyticsConfig;
pub use filter::filter_trades;
pub use grouping::{GroupStat, group_by};
pub use psychology::{Correlation, Insight, compute_correlations, compute_insights};
pub use report::{AnalyticsReport, build_report};
pub use stats::{Stats, compute_stats, win_rate};
pub use targets::{TargetStats, compute_target_stats};
