//! Ordinary least squares trend extrapolation.
//!
//! Fits `y = intercept + slope * t` against the observation index and
//! extrapolates from the end of the history. Negative extrapolations are
//! clamped to zero, so a steep downward trend bottoms out instead of going
//! negative.

use crate::core::{DemandSeries, Forecast};
use crate::detection::OutlierReport;
use crate::error::{ForecastError, Result};
use crate::models::{preprocess, Forecaster};

const MIN_LENGTH: usize = 4;

#[derive(Debug, Clone)]
pub struct TrendRegression {
    clean_outliers: bool,
    fitted: Option<FittedState>,
    outlier_report: Option<OutlierReport>,
}

#[derive(Debug, Clone, Copy)]
struct FittedState {
    intercept: f64,
    slope: f64,
    n: usize,
    r_squared: f64,
}

/// Least squares fit of values against their 0-based index.
/// Returns `(intercept, slope, r_squared)`.
pub(crate) fn ols_fit(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx < 1e-12 {
        return (mean_y, 0.0, 0.0);
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy < 1e-12 {
        0.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };
    (intercept, slope, r_squared)
}

impl TrendRegression {
    pub fn new() -> Self {
        Self {
            clean_outliers: true,
            fitted: None,
            outlier_report: None,
        }
    }

    pub fn without_outlier_cleaning(mut self) -> Self {
        self.clean_outliers = false;
        self
    }

    pub fn slope(&self) -> Option<f64> {
        self.fitted.map(|s| s.slope)
    }

    /// Goodness of fit of the trend line on the training data.
    pub fn r_squared(&self) -> Option<f64> {
        self.fitted.map(|s| s.r_squared)
    }
}

impl Default for TrendRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for TrendRegression {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        if series.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "Regressão com Tendência",
                needed: MIN_LENGTH,
                got: series.len(),
            });
        }
        let (values, report) = preprocess(series, self.clean_outliers);
        if values.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "Regressão com Tendência",
                needed: MIN_LENGTH,
                got: values.len(),
            });
        }
        let (intercept, slope, r_squared) = ols_fit(&values);
        self.outlier_report = report;
        self.fitted = Some(FittedState {
            intercept,
            slope,
            n: values.len(),
            r_squared,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.fitted.ok_or(ForecastError::FitRequired)?;
        let out = (0..horizon)
            .map(|h| {
                let t = (state.n + h) as f64;
                (state.intercept + state.slope * t).max(0.0)
            })
            .collect();
        Ok(Forecast::from_values(out))
    }

    fn name(&self) -> &str {
        "Regressão com Tendência"
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
    fn perfect_line_extrapolates_exactly() {
        let mut model = TrendRegression::new().without_outlier_cleaning();
        model
            .fit(&series(vec![10.0, 20.0, 30.0, 40.0, 50.0]))
            .unwrap();
        assert_relative_eq!(model.slope().unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(model.r_squared().unwrap(), 1.0, epsilon = 1e-9);
        let forecast = model.predict(3).unwrap();
        assert_relative_eq!(forecast.values()[0], 60.0, epsilon = 1e-9);
        assert_relative_eq!(forecast.values()[1], 70.0, epsilon = 1e-9);
        assert_relative_eq!(forecast.values()[2], 80.0, epsilon = 1e-9);
    }

    #[test]
    fn downward_trend_clamps_at_zero() {
        let mut model = TrendRegression::new().without_outlier_cleaning();
        model.fit(&series(vec![40.0, 30.0, 20.0, 10.0])).unwrap();
        let forecast = model.predict(5).unwrap();
        // t=4 gives 0, every later step stays at 0 rather than going negative
        assert_relative_eq!(forecast.values()[0], 0.0);
        assert!(forecast.values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn flat_series_has_zero_slope_and_r_squared() {
        let (intercept, slope, r2) = ols_fit(&[5.0, 5.0, 5.0, 5.0]);
        assert_relative_eq!(intercept, 5.0);
        assert_relative_eq!(slope, 0.0);
        assert_relative_eq!(r2, 0.0);
    }

    #[test]
    fn too_short_series_is_rejected() {
        let mut model = TrendRegression::new();
        let err = model.fit(&series(vec![1.0, 2.0, 3.0])).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PERIODS");
    }
}
