//! Core data structures: demand series, derived statistics, forecasts.

mod forecast;
mod series;
mod stats;

pub use forecast::Forecast;
pub use series::{DemandSeries, Granularity};
pub use stats::SeriesStatistics;
