//! Forecast result structure holding point predictions.

use serde::{Deserialize, Serialize};

/// Ordered point forecasts, one value per future period.
///
/// Demand cannot be negative, so values are clamped at zero when the
/// forecast is constructed via [`Forecast::from_values`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    values: Vec<f64>,
}

impl Forecast {
    /// Create a forecast, clamping every value at zero.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.max(0.0)).collect(),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First forecast step, the value walk-forward validation compares.
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }
}
