//! Weighted moving average with linearly increasing weights.
//!
//! The most recent observation in the window carries the largest weight.
//! Like [`super::sma`], multi-step forecasts roll forward over their own
//! predictions.

use crate::core::{DemandSeries, Forecast};
use crate::detection::OutlierReport;
use crate::error::{ForecastError, Result};
use crate::models::{preprocess, Forecaster};

const MIN_LENGTH: usize = 3;
const MIN_WINDOW: usize = 3;

#[derive(Debug, Clone)]
pub struct WeightedMovingAverage {
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

impl WeightedMovingAverage {
    /// Adaptive window: `max(3, n / 2)` at fit time.
    pub fn adaptive() -> Self {
        Self {
            window: None,
            clean_outliers: true,
            fitted: None,
            outlier_report: None,
        }
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            window: Some(window.max(1)),
            clean_outliers: true,
            fitted: None,
            outlier_report: None,
        }
    }

    pub fn without_outlier_cleaning(mut self) -> Self {
        self.clean_outliers = false;
        self
    }

    /// Weighted mean of the window tail, weights 1..=w oldest to newest.
    fn weighted_mean(tail: &[f64]) -> f64 {
        let weight_sum = (tail.len() * (tail.len() + 1)) as f64 / 2.0;
        let weighted: f64 = tail
            .iter()
            .enumerate()
            .map(|(i, &v)| v * (i + 1) as f64)
            .sum();
        weighted / weight_sum
    }
}

impl Forecaster for WeightedMovingAverage {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        if series.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "WMA",
                needed: MIN_LENGTH,
                got: series.len(),
            });
        }
        let (values, report) = preprocess(series, self.clean_outliers);
        if values.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "WMA",
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
            let next = Self::weighted_mean(tail).max(0.0);
            out.push(next);
            buffer.push(next);
        }
        Ok(Forecast::from_values(out))
    }

    fn name(&self) -> &str {
        "WMA"
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
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
    fn weights_favor_recent_observations() {
        let mut model = WeightedMovingAverage::with_window(3).without_outlier_cleaning();
        model.fit(&series(vec![10.0, 20.0, 30.0])).unwrap();
        let forecast = model.predict(1).unwrap();
        // (10*1 + 20*2 + 30*3) / 6 = 140 / 6
        assert_relative_eq!(forecast.values()[0], 140.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_series_stays_constant() {
        let mut model = WeightedMovingAverage::adaptive().without_outlier_cleaning();
        model.fit(&series(vec![50.0; 10])).unwrap();
        let forecast = model.predict(5).unwrap();
        for &v in forecast.values() {
            assert_relative_eq!(v, 50.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn too_short_series_is_rejected() {
        let mut model = WeightedMovingAverage::adaptive();
        let err = model.fit(&series(vec![1.0, 2.0])).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PERIODS");
    }

    #[test]
    fn multi_step_uses_rolled_buffer() {
        let mut model = WeightedMovingAverage::with_window(2).without_outlier_cleaning();
        model.fit(&series(vec![10.0, 20.0, 30.0])).unwrap();
        let forecast = model.predict(2).unwrap();
        // step 1: (20*1 + 30*2)/3 = 80/3
        let step1 = 80.0 / 3.0;
        assert_relative_eq!(forecast.values()[0], step1, epsilon = 1e-9);
        // step 2: (30*1 + step1*2)/3
        assert_relative_eq!(
            forecast.values()[1],
            (30.0 + 2.0 * step1) / 3.0,
            epsilon = 1e-9
        );
    }
}
