//! Forecaster trait defining the common interface for all models.

use crate::core::{DemandSeries, Forecast};
use crate::detection::OutlierReport;
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// Models are created stateless, transition to a fitted state via `fit`,
/// and can then be asked to `predict` any number of times without refitting.
/// Prediction never mutates the fitted state, so repeated calls with the
/// same horizon return identical forecasts.
pub trait Forecaster: Send {
    /// Fit the model to the demand series.
    fn fit(&mut self, series: &DemandSeries) -> Result<()>;

    /// Generate non-negative predictions for the specified horizon.
    ///
    /// Returns [`ForecastError::FitRequired`](crate::error::ForecastError::FitRequired)
    /// when called before `fit`.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Canonical display name of the model.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;

    /// Outlier report produced during fitting, when pre-cleaning was enabled.
    ///
    /// Never silently discarded: any model configured to clean its input
    /// keeps the report for downstream transparency.
    fn outlier_report(&self) -> Option<&OutlierReport> {
        None
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;
