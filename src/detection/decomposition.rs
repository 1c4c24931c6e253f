//! Additive decomposition of a series into trend, seasonal and residual parts.
//!
//! The trend is a centered moving average, linearly extrapolated at the
//! edges; the seasonal component is the per-position mean of the detrended
//! series, centered so the indices sum to zero.

use crate::error::{ForecastError, Result};

/// Result of additively decomposing a series with a candidate period.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    /// One centered seasonal index per position in the period.
    pub seasonal_indices: Vec<f64>,
    pub period: usize,
}

impl Decomposition {
    /// Seasonal strength: Var(seasonal) / (Var(seasonal) + Var(residual)).
    pub fn seasonal_strength(&self) -> f64 {
        let var_s = population_variance(&self.seasonal);
        let var_r = population_variance(&self.residual);
        let denom = var_s + var_r;
        if denom < 1e-10 {
            return 0.0;
        }
        (var_s / denom).clamp(0.0, 1.0)
    }
}

/// Additively decompose `values` with the given seasonal period.
///
/// Requires at least two full cycles so every seasonal position is observed
/// in more than one cycle.
pub fn additive_decompose(values: &[f64], period: usize) -> Result<Decomposition> {
    let n = values.len();
    if period < 2 {
        return Err(ForecastError::InvalidParameter(
            "seasonal period must be at least 2".to_string(),
        ));
    }
    if n < 2 * period {
        return Err(ForecastError::InsufficientData {
            needed: 2 * period,
            got: n,
        });
    }

    let trend = centered_trend(values, period)?;

    let detrended: Vec<f64> = values.iter().zip(trend.iter()).map(|(v, t)| v - t).collect();

    // Per-position means across cycles, centered to sum to zero.
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, &d) in detrended.iter().enumerate() {
        sums[i % period] += d;
        counts[i % period] += 1;
    }
    let mut indices: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let center = indices.iter().sum::<f64>() / period as f64;
    for idx in indices.iter_mut() {
        *idx -= center;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| indices[i % period]).collect();
    let residual: Vec<f64> = values
        .iter()
        .zip(trend.iter())
        .zip(seasonal.iter())
        .map(|((v, t), s)| v - t - s)
        .collect();

    Ok(Decomposition {
        trend,
        seasonal,
        residual,
        seasonal_indices: indices,
        period,
    })
}

/// Centered moving average trend with linear extrapolation at the edges.
///
/// Even periods use the standard 2×period weighting (half weight on the two
/// outermost points) so the window stays centered.
fn centered_trend(values: &[f64], period: usize) -> Result<Vec<f64>> {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![f64::NAN; n];

    if period % 2 == 1 {
        for i in half..n - half {
            let window = &values[i - half..=i + half];
            trend[i] = window.iter().sum::<f64>() / period as f64;
        }
    } else {
        for i in half..n - half {
            let mut sum = 0.5 * values[i - half] + 0.5 * values[i + half];
            for j in (i - half + 1)..(i + half) {
                sum += values[j];
            }
            trend[i] = sum / period as f64;
        }
    }

    let first_valid = trend.iter().position(|v| !v.is_nan());
    let last_valid = trend.iter().rposition(|v| !v.is_nan());
    let (first, last) = match (first_valid, last_valid) {
        (Some(f), Some(l)) if l > f => (f, l),
        _ => {
            return Err(ForecastError::ComputationError(
                "trend window leaves no interior points".to_string(),
            ))
        }
    };

    // Extrapolate linearly from the slope at each end of the valid range.
    let lead_slope = trend[first + 1] - trend[first];
    for i in 0..first {
        trend[i] = trend[first] - lead_slope * (first - i) as f64;
    }
    let tail_slope = trend[last] - trend[last - 1];
    for i in last + 1..n {
        trend[i] = trend[last] + tail_slope * (i - last) as f64;
    }

    Ok(trend)
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64
}
