//! Intermittent demand models of the Croston family.
//!
//! Demand arrives sporadically, so classic smoothing over-reacts to the
//! zeros. Croston smooths demand sizes and inter-demand intervals
//! separately; SBA applies the Syntetos-Boylan bias correction; TSB
//! smooths the demand probability directly and updates every period, which
//! lets the forecast decay during long zero runs in the history.

use crate::core::{DemandSeries, Forecast};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;

const MIN_LENGTH: usize = 4;
pub const DEFAULT_ALPHA: f64 = 0.1;

/// Which member of the Croston family to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrostonVariant {
    /// Original Croston: size / interval.
    Classic,
    /// Syntetos-Boylan approximation: Croston scaled by `1 - alpha/2`.
    Sba,
    /// Teunter-Syntetos-Babai: smoothed probability times smoothed size.
    Tsb,
}

#[derive(Debug, Clone)]
pub struct IntermittentDemand {
    variant: CrostonVariant,
    alpha: f64,
    rate: Option<f64>,
}

impl IntermittentDemand {
    pub fn new(variant: CrostonVariant, alpha: f64) -> Self {
        Self {
            variant,
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            rate: None,
        }
    }

    /// TSB with the default smoothing constant. This is the registry model.
    pub fn tsb() -> Self {
        Self::new(CrostonVariant::Tsb, DEFAULT_ALPHA)
    }

    pub fn croston() -> Self {
        Self::new(CrostonVariant::Classic, DEFAULT_ALPHA)
    }

    pub fn sba() -> Self {
        Self::new(CrostonVariant::Sba, DEFAULT_ALPHA)
    }

    /// Smoothed per-period demand rate after fitting.
    pub fn demand_rate(&self) -> Option<f64> {
        self.rate
    }

    /// Non-zero demand sizes and the intervals between them. The first
    /// interval counts from the start of the series.
    fn demands_and_intervals(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut demands = Vec::new();
        let mut intervals = Vec::new();
        let mut gap = 0usize;
        for &v in values {
            gap += 1;
            if v > 0.0 {
                demands.push(v);
                intervals.push(gap as f64);
                gap = 0;
            }
        }
        (demands, intervals)
    }

    fn croston_rate(&self, demands: &[f64], intervals: &[f64]) -> f64 {
        let mut size = demands[0];
        let mut interval = intervals[0];
        for (&d, &i) in demands.iter().zip(intervals).skip(1) {
            size = self.alpha * d + (1.0 - self.alpha) * size;
            interval = self.alpha * i + (1.0 - self.alpha) * interval;
        }
        let rate = size / interval.max(1.0);
        match self.variant {
            CrostonVariant::Sba => rate * (1.0 - self.alpha / 2.0),
            _ => rate,
        }
    }

    fn tsb_rate(&self, values: &[f64]) -> f64 {
        let first_demand = values.iter().copied().find(|&v| v > 0.0).unwrap_or(0.0);
        let nonzero = values.iter().filter(|&&v| v > 0.0).count();
        let mut probability = nonzero as f64 / values.len() as f64;
        let mut size = first_demand;
        for &v in values {
            if v > 0.0 {
                probability = self.alpha * 1.0 + (1.0 - self.alpha) * probability;
                size = self.alpha * v + (1.0 - self.alpha) * size;
            } else {
                probability = (1.0 - self.alpha) * probability;
            }
        }
        probability * size
    }
}

impl Forecaster for IntermittentDemand {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        if series.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientPeriodsForMethod {
                method: "TSB",
                needed: MIN_LENGTH,
                got: series.len(),
            });
        }
        // Outlier cleaning is skipped on purpose: zeros are signal here.
        let values = series.values();
        let (demands, intervals) = Self::demands_and_intervals(values);
        let rate = if demands.is_empty() {
            0.0
        } else if demands.len() < 2 {
            // One occurrence is not enough to smooth; fall back to the mean.
            values.iter().sum::<f64>() / values.len() as f64
        } else {
            match self.variant {
                CrostonVariant::Tsb => self.tsb_rate(values),
                _ => self.croston_rate(&demands, &intervals),
            }
        };
        self.rate = Some(rate);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let rate = self.rate.ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(vec![rate.max(0.0); horizon]))
    }

    fn name(&self) -> &str {
        match self.variant {
            CrostonVariant::Classic => "Croston",
            CrostonVariant::Sba => "Croston-SBA",
            CrostonVariant::Tsb => "TSB",
        }
    }

    fn is_fitted(&self) -> bool {
        self.rate.is_some()
    }
}
