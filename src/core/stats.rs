//! Derived series statistics used by every decision component.

use serde::{Deserialize, Serialize};

/// Immutable snapshot of a series' statistical character.
///
/// Computed once per forecasting request and shared by the outlier detector,
/// the seasonality detector and the method selector; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub len: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Adjusted Fisher-Pearson skewness; 0.0 for degenerate series.
    pub skewness: f64,
    /// Excess kurtosis (normal distribution = 0); 0.0 for degenerate series.
    pub kurtosis: f64,
    /// Fraction of periods with exactly zero demand.
    pub zero_fraction: f64,
    /// Coefficient of variation (std/mean); 0.0 when the mean is zero.
    pub coefficient_of_variation: f64,
}

impl SeriesStatistics {
    /// Compute the snapshot from raw values.
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self::degenerate();
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let zero_fraction = values.iter().filter(|&&v| v == 0.0).count() as f64 / n as f64;

        let std_dev = if n < 2 {
            0.0
        } else {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (n - 1) as f64).sqrt()
        };

        let coefficient_of_variation = if mean.abs() > 1e-10 {
            std_dev / mean.abs()
        } else {
            0.0
        };

        Self {
            len: n,
            mean,
            std_dev,
            min,
            max,
            skewness: skewness(values, mean, std_dev),
            kurtosis: kurtosis(values, mean, std_dev),
            zero_fraction,
            coefficient_of_variation,
        }
    }

    /// Relative range (max - min) / mean; 0.0 when the mean is zero.
    pub fn relative_range(&self) -> f64 {
        if self.mean.abs() > 1e-10 {
            (self.max - self.min) / self.mean.abs()
        } else {
            0.0
        }
    }

    fn degenerate() -> Self {
        Self {
            len: 0,
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
            zero_fraction: 0.0,
            coefficient_of_variation: 0.0,
        }
    }
}

/// Adjusted Fisher-Pearson standardized moment coefficient.
fn skewness(values: &[f64], mean: f64, std_dev: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 || std_dev < 1e-10 {
        return 0.0;
    }
    let sum_cubed: f64 = values.iter().map(|x| ((x - mean) / std_dev).powi(3)).sum();
    (n / ((n - 1.0) * (n - 2.0))) * sum_cubed
}

/// Excess kurtosis (fourth standardized moment minus 3, small-sample adjusted).
fn kurtosis(values: &[f64], mean: f64, std_dev: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 || std_dev < 1e-10 {
        return 0.0;
    }
    let sum_fourth: f64 = values.iter().map(|x| ((x - mean) / std_dev).powi(4)).sum();
    let k = (n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0))) * sum_fourth;
    k - (3.0 * (n - 1.0).powi(2)) / ((n - 2.0) * (n - 3.0))
}
