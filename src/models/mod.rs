//! Forecasting models and the method registry.
//!
//! The six concrete strategies plus the AUTO meta-strategy form a closed set:
//! [`ForecastMethod`] is the registry, and `create` is the single dispatch
//! point. Legacy name aliases are translated only at the parsing boundary,
//! never inside the engine.

pub mod auto;
pub mod intermittent;
pub mod seasonal;
pub mod ses;
pub mod sma;
pub mod trend;
mod traits;
pub mod wma;

pub use auto::AutoSelector;
pub use intermittent::{CrostonVariant, IntermittentDemand};
pub use seasonal::SeasonalDecomposition;
pub use ses::ExponentialSmoothing;
pub use sma::SimpleMovingAverage;
pub use traits::{BoxedForecaster, Forecaster};
pub use trend::TrendRegression;
pub use wma::WeightedMovingAverage;

use crate::audit::{AuditSink, NoopAuditSink};
use crate::core::DemandSeries;
use crate::detection::{OutlierDetector, OutlierReport};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The closed set of forecasting methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastMethod {
    /// Simple moving average with adaptive window.
    Sma,
    /// Weighted moving average, linearly increasing weights.
    Wma,
    /// Simple exponential smoothing (flat forecast).
    Ema,
    /// Ordinary least squares trend extrapolation.
    TrendRegression,
    /// Additive seasonal decomposition, monthly cycle.
    SeasonalDecomposition,
    /// Intermittent demand (Croston family, TSB variant).
    Tsb,
    /// Meta-strategy: pick the best of the six automatically.
    Auto,
}

impl ForecastMethod {
    /// All methods, in registry order.
    pub const ALL: [ForecastMethod; 7] = [
        ForecastMethod::Sma,
        ForecastMethod::Wma,
        ForecastMethod::Ema,
        ForecastMethod::TrendRegression,
        ForecastMethod::SeasonalDecomposition,
        ForecastMethod::Tsb,
        ForecastMethod::Auto,
    ];

    /// The six concrete (non-meta) methods.
    pub const CONCRETE: [ForecastMethod; 6] = [
        ForecastMethod::Sma,
        ForecastMethod::Wma,
        ForecastMethod::Ema,
        ForecastMethod::TrendRegression,
        ForecastMethod::SeasonalDecomposition,
        ForecastMethod::Tsb,
    ];

    /// Canonical registry name, kept compatible with the legacy system.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ForecastMethod::Sma => "SMA",
            ForecastMethod::Wma => "WMA",
            ForecastMethod::Ema => "EMA",
            ForecastMethod::TrendRegression => "Regressão com Tendência",
            ForecastMethod::SeasonalDecomposition => "Decomposição Sazonal",
            ForecastMethod::Tsb => "TSB",
            ForecastMethod::Auto => "AUTO",
        }
    }

    /// Minimum history length required to fit this method.
    pub fn min_length(&self) -> usize {
        match self {
            ForecastMethod::Sma | ForecastMethod::Wma => 3,
            ForecastMethod::Ema => 4,
            ForecastMethod::TrendRegression => 4,
            // Two full seasonal cycles at monthly granularity.
            ForecastMethod::SeasonalDecomposition => 24,
            ForecastMethod::Tsb => 4,
            ForecastMethod::Auto => 3,
        }
    }

    /// Whether zeros are expected input for this method.
    pub fn tolerates_zeros(&self) -> bool {
        matches!(self, ForecastMethod::Tsb | ForecastMethod::Auto)
    }

    /// Resolve a method name, accepting legacy aliases.
    ///
    /// Unknown names error with the full list of valid canonical names so
    /// the registry stays discoverable.
    pub fn parse(name: &str) -> Result<ForecastMethod> {
        let normalized = name.trim();
        let method = match normalized.to_lowercase().as_str() {
            "sma" | "média móvel simples" | "media movel simples" => ForecastMethod::Sma,
            "wma" | "média móvel ponderada" | "media movel ponderada" => ForecastMethod::Wma,
            "ema" | "ses" | "suavização exponencial" | "suavizacao exponencial" => {
                ForecastMethod::Ema
            }
            "regressão com tendência" | "regressao com tendencia" | "trend-regression" => {
                ForecastMethod::TrendRegression
            }
            "decomposição sazonal" | "decomposicao sazonal" | "seasonal-decomposition" => {
                ForecastMethod::SeasonalDecomposition
            }
            "tsb" | "croston" => ForecastMethod::Tsb,
            "auto" => ForecastMethod::Auto,
            _ => {
                return Err(ForecastError::UnknownMethod {
                    name: name.to_string(),
                    valid: Self::ALL
                        .iter()
                        .map(|m| m.canonical_name().to_string())
                        .collect(),
                })
            }
        };
        Ok(method)
    }

    /// Instantiate an unfitted model. AUTO gets a no-op audit sink; use
    /// [`create_with_sink`](Self::create_with_sink) to capture its decisions.
    pub fn create(&self) -> BoxedForecaster {
        self.create_with_sink(Arc::new(NoopAuditSink))
    }

    /// Instantiate an unfitted model, wiring the audit sink into AUTO.
    pub fn create_with_sink(&self, sink: Arc<dyn AuditSink>) -> BoxedForecaster {
        match self {
            ForecastMethod::Sma => Box::new(SimpleMovingAverage::adaptive()),
            ForecastMethod::Wma => Box::new(WeightedMovingAverage::adaptive()),
            ForecastMethod::Ema => Box::new(ExponentialSmoothing::new(0.3)),
            ForecastMethod::TrendRegression => Box::new(TrendRegression::new()),
            ForecastMethod::SeasonalDecomposition => Box::new(SeasonalDecomposition::new()),
            ForecastMethod::Tsb => Box::new(IntermittentDemand::tsb()),
            ForecastMethod::Auto => Box::new(AutoSelector::new(sink)),
        }
    }
}

/// Shared pre-fit hook: optionally clean outliers, returning the values the
/// model should fit on and the report to retain.
pub(crate) fn preprocess(
    series: &DemandSeries,
    clean_outliers: bool,
) -> (Vec<f64>, Option<OutlierReport>) {
    if clean_outliers {
        let report = OutlierDetector::new().analyze_and_clean(series.values());
        (report.cleaned_values.clone(), Some(report))
    } else {
        (series.values().to_vec(), None)
    }
}
