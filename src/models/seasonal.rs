//! Additive seasonal decomposition forecast.
//!
//! Detects the seasonal period, decomposes the history, and forecasts by
//! extrapolating an OLS trend plus the seasonal index for each future
//! position. Prediction is self-feeding: each forecast step is appended to
//! the working buffer before the next, so the trend component re-fits on
//! the extended series as the horizon advances.

use crate::core::{DemandSeries, Forecast};
use crate::detection::{OutlierReport, SeasonalityDetector, SeasonalityReport};
use crate::error::{ForecastError, Result};
use crate::models::trend::ols_fit;
use crate::models::{preprocess, Forecaster};

const MIN_LENGTH: usize = 24;
const DEFAULT_PERIOD: usize = 12;

#[derive(Debug, Clone)]
pub struct SeasonalDecomposition {
    clean_outliers: bool,
    fitted: Option<FittedState>,
    seasonality_report: Option<SeasonalityReport>,
    outlier_report: Option<OutlierReport>,
}

#[derive(Debug, Clone)]
struct FittedState {
    values: Vec<f64>,
    period: usize,
    seasonal_indices: Vec<f64>,
}

impl SeasonalDecomposition {
    pub fn new() -> Self {
        Self {
            clean_outliers: true,
            fitted: None,
            seasonality_report: None,
            outlier_report: None,
        }
    }

    pub fn without_outlier_cleaning(mut self) -> Self {
        self.clean_outliers = false;
        self
    }

    /// Detection outcome from the last fit.
    pub fn seasonality_report(&self) -> Option<&SeasonalityReport> {
        self.seasonality_report.as_ref()
    }

    pub fn period(&self) -> Option<usize> {
        self.fitted.as_ref().map(|s| s.period)
    }

    /// Centered per-position means of the detrended series.
    fn seasonal_indices(values: &[f64], period: usize) -> Vec<f64> {
        let (intercept, slope, _) = ols_fit(values);
        let mut sums = vec![0.0; period];
        let mut counts = vec![0usize; period];
        for (i, &v) in values.iter().enumerate() {
            let detrended = v - (intercept + slope * i as f64);
            sums[i % period] += detrended;
            counts[i % period] += 1;
        }
        let mut indices: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();
        let mean = indices.iter().sum::<f64>() / period as f64;
        for idx in &mut indices {
            *idx -= mean;
        }
        indices
    }
}

impl Default for SeasonalDecomposition {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for SeasonalDecomposition {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        if series.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "Decomposição Sazonal",
                needed: MIN_LENGTH,
                got: series.len(),
            });
        }
        let (values, outlier_report) = preprocess(series, self.clean_outliers);
        if values.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "Decomposição Sazonal",
                needed: MIN_LENGTH,
                got: values.len(),
            });
        }
        let report = SeasonalityDetector::new().detect(&values);
        let period = report
            .seasonal_period
            .filter(|&p| values.len() >= 2 * p)
            .unwrap_or(DEFAULT_PERIOD);
        let seasonal_indices = Self::seasonal_indices(&values, period);
        self.outlier_report = outlier_report;
        self.seasonality_report = Some(report);
        self.fitted = Some(FittedState {
            values,
            period,
            seasonal_indices,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
        let mut buffer = state.values.clone();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let (intercept, slope, _) = ols_fit(&buffer);
            let t = buffer.len();
            let trend = intercept + slope * t as f64;
            let seasonal = state.seasonal_indices[t % state.period];
            let next = (trend + seasonal).max(0.0);
            out.push(next);
            buffer.push(next);
        }
        Ok(Forecast::from_values(out))
    }

    fn name(&self) -> &str {
        "Decomposição Sazonal"
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

    fn seasonal_values(cycles: usize) -> Vec<f64> {
        let pattern = [
            80.0, 85.0, 95.0, 100.0, 110.0, 120.0, 130.0, 125.0, 110.0, 100.0, 90.0, 85.0,
        ];
        (0..cycles).flat_map(|_| pattern).collect()
    }

    #[test]
    fn fits_a_clean_annual_cycle() {
        let mut model = SeasonalDecomposition::new().without_outlier_cleaning();
        model.fit(&series(seasonal_values(3))).unwrap();
        assert_eq!(model.period(), Some(12));
        let forecast = model.predict(12).unwrap();
        assert_eq!(forecast.horizon(), 12);
        // The next cycle should track the pattern: July peak, January trough.
        assert_relative_eq!(forecast.values()[6], 130.0, epsilon = 8.0);
        assert_relative_eq!(forecast.values()[0], 80.0, epsilon = 8.0);
        assert!(forecast.values()[6] > forecast.values()[0] + 30.0);
    }

    #[test]
    fn seasonal_indices_are_centered() {
        let indices = SeasonalDecomposition::seasonal_indices(&seasonal_values(2), 12);
        let sum: f64 = indices.iter().sum();
        assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn short_series_is_rejected() {
        let mut model = SeasonalDecomposition::new();
        let err = model.fit(&series(vec![100.0; 23])).unwrap_err();
        match err {
            ForecastError::InsufficientPeriodsForMethod { needed, got, .. } => {
                assert_eq!(needed, 24);
                assert_eq!(got, 23);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_annual_period_without_detection() {
        // Flat series: detector finds nothing, period defaults to 12.
        let mut model = SeasonalDecomposition::new().without_outlier_cleaning();
        model.fit(&series(vec![100.0; 24])).unwrap();
        assert_eq!(model.period(), Some(12));
        assert!(!model.seasonality_report().unwrap().has_seasonality);
        let forecast = model.predict(6).unwrap();
        for &v in forecast.values() {
            assert_relative_eq!(v, 100.0, epsilon = 1e-6);
        }
    }
}
