//! Demand forecasting engine for retail replenishment.
//!
//! The crate takes a per-store/SKU demand history and produces a forecast
//! plus the diagnostics needed to trust it: input validation, outlier
//! detection and treatment, seasonality detection, six interchangeable
//! forecasting strategies, an AUTO meta-strategy that picks among them, and
//! walk-forward accuracy evaluation.
//!
//! ```
//! use demanda_forecast::core::DemandSeries;
//! use demanda_forecast::models::ForecastMethod;
//!
//! let series = DemandSeries::monthly(
//!     "store-1/sku-42",
//!     vec![100.0, 102.0, 99.0, 101.0, 100.0, 103.0, 97.0, 102.0, 99.0, 100.0, 101.0, 98.0],
//! )?;
//! let mut model = ForecastMethod::Auto.create();
//! model.fit(&series)?;
//! let forecast = model.predict(3)?;
//! assert_eq!(forecast.horizon(), 3);
//! # Ok::<(), demanda_forecast::ForecastError>(())
//! ```

pub mod audit;
pub mod core;
pub mod detection;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod selection;
pub mod validation;

pub use error::{ForecastError, Result};

/// Commonly used items in one import.
pub mod prelude {
    pub use crate::audit::{AuditSink, MemoryAuditSink, NoopAuditSink, TracingAuditSink};
    pub use crate::core::{DemandSeries, Forecast, Granularity, SeriesStatistics};
    pub use crate::detection::{OutlierDetector, OutlierReport, SeasonalityDetector, SeasonalityReport};
    pub use crate::error::{ForecastError, Result};
    pub use crate::evaluation::{walk_forward, AccuracyResult, WalkForwardConfig};
    pub use crate::models::{BoxedForecaster, ForecastMethod, Forecaster};
    pub use crate::selection::{DemandPattern, MethodRecommendation, MethodSelector};
    pub use crate::validation::{validate, validate_forecast_inputs, ValidationOptions};
}
