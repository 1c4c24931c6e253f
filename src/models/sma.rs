//! Simple moving average.
//!
//! The window defaults to half the history length (floor), never below 3.
//! Multi-step forecasts roll the window forward over their own predictions,
//! so the forecast converges toward the recent mean instead of repeating a
//! single value.

use crate::core::{DemandSeries, Forecast};
use crate::detection::OutlierReport;
use crate::error::{ForecastError, Result};
use crate::models::{preprocess, Forecaster};

const MIN_LENGTH: usize = 3;
const MIN_WINDOW: usize = 3;

#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: Option<usize>,
    clean_outliers: bool,
    fitted: Option<FittedState>,
    outlier_report: Option<OutlierReport>,
}

#[derive(Debug, Clone)]
struct FittedState {
    values: Vec<f64>,
    window: usize,
}

impl SimpleMovingAverage {
    /// Adaptive window: `max(3, n / 2)` at fit time.
    pub fn adaptive() -> Self {
        Self {
            window: None,
            clean_outliers: true,
            fitted: None,
            outlier_report: None,
        }
    }

    /// Fixed window size.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: Some(window.max(1)),
            clean_outliers: true,
            fitted: None,
            outlier_report: None,
        }
    }

    /// Disable the outlier cleaning pre-step.
    pub fn without_outlier_cleaning(mut self) -> Self {
        self.clean_outliers = false;
        self
    }

    /// Effective window after fitting.
    pub fn window(&self) -> Option<usize> {
        self.fitted.as_ref().map(|s| s.window)
    }
}

impl Forecaster for SimpleMovingAverage {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        if series.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "SMA",
                needed: MIN_LENGTH,
                got: series.len(),
            });
        }
        let (values, report) = preprocess(series, self.clean_outliers);
        if values.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "SMA",
                needed: MIN_LENGTH,
                got: values.len(),
            });
        }
        let window = self
            .window
            .unwrap_or_else(|| (values.len() / 2).max(MIN_WINDOW))
            .min(values.len());
        self.outlier_report = report;
        self.fitted = Some(FittedState { values, window });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
        let mut buffer = state.values.clone();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let tail = &buffer[buffer.len() - state.window..];
            let next = (tail.iter().sum::<f64>() / state.window as f64).max(0.0);
            out.push(next);
            buffer.push(next);
        }
        Ok(Forecast::from_values(out))
    }

    fn name(&self) -> &str {
        "SMA"
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn outlier_report(&self) -> Option<&OutlierReport> {
        self.outlier_report.as_ref()
    }
}
