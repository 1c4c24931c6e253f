//! Simple exponential smoothing.
//!
//! A single smoothed level is updated over the history and repeated for
//! every step of the horizon. The flat forecast is a known degeneracy of
//! SES without trend or seasonal components; the selector only recommends
//! it for volatile, non-trending demand.

use crate::core::{DemandSeries, Forecast};
use crate::detection::OutlierReport;
use crate::error::{ForecastError, Result};
use crate::models::{preprocess, Forecaster};

const MIN_LENGTH: usize = 4;
pub const DEFAULT_ALPHA: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    alpha: f64,
    clean_outliers: bool,
    level: Option<f64>,
    outlier_report: Option<OutlierReport>,
}

impl ExponentialSmoothing {
    /// `alpha` must be in (0, 1].
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            clean_outliers: true,
            level: None,
            outlier_report: None,
        }
    }

    pub fn without_outlier_cleaning(mut self) -> Self {
        self.clean_outliers = false;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smoothed level after fitting.
    pub fn level(&self) -> Option<f64> {
        self.level
    }
}

impl Default for ExponentialSmoothing {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl Forecaster for ExponentialSmoothing {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        if series.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "EMA",
                needed: MIN_LENGTH,
                got: series.len(),
            });
        }
        let (values, report) = preprocess(series, self.clean_outliers);
        if values.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "EMA",
                needed: MIN_LENGTH,
                got: values.len(),
            });
        }
        let mut level = values[0];
        for &v in &values[1..] {
            level = self.alpha * v + (1.0 - self.alpha) * level;
        }
        self.outlier_report = report;
        self.level = Some(level);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(vec![level.max(0.0); horizon]))
    }

    fn name(&self) -> &str {
        "EMA"
    }

    fn is_fitted(&self) -> bool {
        self.level.is_some()
    }

    fn outlier_report(&self) -> Option<&OutlierReport> {
        self.outlier_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(values: Vec<f64>) -> DemandSeries {
        DemandSeries::monthly("sku", values).unwrap()
    }

    #[test]
    fn level_updates_follow_smoothing_recursion() {
        let mut model = ExponentialSmoothing::new(0.5).without_outlier_cleaning();
        model.fit(&series(vec![10.0, 20.0, 10.0, 20.0])).unwrap();
        // l0 = 10, l1 = 15, l2 = 12.5, l3 = 16.25
        assert_relative_eq!(model.level().unwrap(), 16.25, epsilon = 1e-9);
    }

    #[test]
    fn forecast_is_flat_at_final_level() {
        let mut model = ExponentialSmoothing::default().without_outlier_cleaning();
        model
            .fit(&series(vec![100.0, 120.0, 90.0, 110.0, 105.0]))
            .unwrap();
        let forecast = model.predict(6).unwrap();
        assert_eq!(forecast.horizon(), 6);
        let first = forecast.values()[0];
        assert!(forecast.values().iter().all(|&v| v == first));
    }

    #[test]
    fn alpha_is_clamped_into_unit_interval() {
        assert_relative_eq!(ExponentialSmoothing::new(1.7).alpha(), 1.0);
        assert!(ExponentialSmoothing::new(-0.5).alpha() > 0.0);
    }

    #[test]
    fn too_short_series_is_rejected() {
        let mut model = ExponentialSmoothing::default();
        let err = model.fit(&series(vec![1.0, 2.0, 3.0])).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PERIODS");
    }
}
