//! Walk-forward accuracy evaluation.
//!
//! For each fold a fresh model is fitted on the history prefix and its
//! first forecast step is compared against the next actual. Aggregate
//! metrics use the collected (predicted, actual) pairs. WMAPE and MAPE
//! only consider pairs whose actual clears `min_value`, which keeps
//! near-zero actuals from exploding the percentages; BIAS and MAE stay
//! unfiltered so systematic error on small actuals is still visible.

use crate::core::DemandSeries;
use crate::error::{ForecastError, Result};
use crate::models::ForecastMethod;
use serde::{Deserialize, Serialize};

/// Sentinel for a percentage metric that could not be computed because no
/// actual cleared the filter. Deliberately absurd so it sorts last.
pub const METRIC_NOT_COMPUTABLE: f64 = 999.9;

/// Walk-forward evaluation parameters.
#[derive(Debug, Clone, Copy)]
pub struct WalkForwardConfig {
    /// Steps predicted per fold. Only the first value is scored.
    pub horizon: usize,
    /// Smallest training prefix.
    pub min_train_size: usize,
    /// Actuals below this are excluded from WMAPE and MAPE.
    pub min_value: f64,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            horizon: 1,
            min_train_size: 6,
            min_value: 2.0,
        }
    }
}

/// Aggregate accuracy over all successful folds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyResult {
    /// Weighted MAPE in percent: sum of |error| over sum of actuals.
    pub wmape: f64,
    /// Mean absolute percentage error in percent.
    pub mape: f64,
    /// Mean of (predicted - actual). Positive means over-forecasting.
    pub bias: f64,
    /// Mean absolute error, unfiltered.
    pub mae: f64,
    /// Folds that produced a comparison.
    pub n_folds: usize,
    /// (predicted, actual) per successful fold, in time order.
    pub pairs: Vec<(f64, f64)>,
}

impl AccuracyResult {
    /// Whether WMAPE survived the filter. A non-computable WMAPE means no
    /// actual in the evaluation window cleared `min_value`.
    pub fn is_computable(&self) -> bool {
        self.wmape != METRIC_NOT_COMPUTABLE
    }
}

/// Evaluate `method` on `series` by walk-forward validation.
///
/// Folds that fail to fit or predict are skipped; the evaluation only
/// errors when the series cannot host a single fold or every fold failed.
/// `Auto` is rejected because it would recurse into this evaluator.
pub fn walk_forward(
    series: &DemandSeries,
    method: ForecastMethod,
    config: &WalkForwardConfig,
) -> Result<AccuracyResult> {
    if method == ForecastMethod::Auto {
        return Err(ForecastError::InvalidParameter(
            "AUTO cannot be walk-forward evaluated; evaluate a concrete method".to_string(),
        ));
    }
    if config.horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "walk-forward horizon must be at least 1".to_string(),
        ));
    }
    let min_train = config.min_train_size.max(method.min_length());
    let n = series.len();
    if n < min_train + config.horizon {
        return Err(ForecastError::InsufficientData {
            needed: min_train + config.horizon,
            got: n,
        });
    }

    let mut pairs = Vec::new();
    for train_len in min_train..=n - config.horizon {
        let train = series.prefix(train_len)?;
        let mut model = method.create();
        if let Err(e) = model.fit(&train) {
            tracing::debug!(method = method.canonical_name(), train_len, error = %e, "fold fit failed");
            continue;
        }
        let forecast = match model.predict(config.horizon) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(method = method.canonical_name(), train_len, error = %e, "fold predict failed");
                continue;
            }
        };
        // Only the first predicted value is scored, so folds never overlap.
        let predicted = forecast.values()[0];
        let actual = series.values()[train_len];
        pairs.push((predicted, actual));
    }

    if pairs.is_empty() {
        return Err(ForecastError::NoSuccessfulValidation);
    }
    Ok(summarize(pairs, config.min_value))
}

fn summarize(pairs: Vec<(f64, f64)>, min_value: f64) -> AccuracyResult {
    let n = pairs.len() as f64;
    let bias = pairs.iter().map(|(p, a)| p - a).sum::<f64>() / n;
    let mae = pairs.iter().map(|(p, a)| (p - a).abs()).sum::<f64>() / n;

    let filtered: Vec<&(f64, f64)> = pairs.iter().filter(|(_, a)| *a >= min_value).collect();
    let (wmape, mape) = if filtered.is_empty() {
        (METRIC_NOT_COMPUTABLE, METRIC_NOT_COMPUTABLE)
    } else {
        let abs_err: f64 = filtered.iter().map(|(p, a)| (p - a).abs()).sum();
        let actual_sum: f64 = filtered.iter().map(|(_, a)| a).sum();
        let wmape = 100.0 * abs_err / actual_sum;
        let mape = 100.0
            * filtered
                .iter()
                .map(|(p, a)| (p - a).abs() / a)
                .sum::<f64>()
            / filtered.len() as f64;
        (wmape, mape)
    };

    AccuracyResult {
        wmape,
        mape,
        bias,
        mae,
        n_folds: pairs.len(),
        pairs,
    }
}
