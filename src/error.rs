//! Error types for the demand forecasting engine.
//!
//! Every rejected input carries a stable code, a message, and an actionable
//! suggestion so operators can self-diagnose without reading source code.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during validation, fitting and evaluation.
///
/// All variants are recoverable by the caller; none are process-fatal.
/// Soft failures (a skipped walk-forward fold, a failed decomposition for one
/// candidate period, an empty outlier scan) are absorbed into report objects
/// and never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input series has no observations.
    #[error("empty input series")]
    EmptyData,

    /// Missing (NaN/infinite) values found where not allowed.
    #[error("missing values at indices {indices:?}")]
    MissingValues { indices: Vec<usize> },

    /// Series is shorter than the general minimum length.
    #[error("series too short: need at least {needed} periods, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Negative values found; demand cannot be negative.
    #[error("{count} negative value(s) found, e.g. at indices {sample_indices:?}")]
    NegativeValues {
        count: usize,
        sample_indices: Vec<usize>,
    },

    /// Zero values found while the requested method does not tolerate them.
    #[error("{count} zero value(s) found but zeros are not permitted for this method")]
    ZerosNotAllowed { count: usize },

    /// Forecast horizon below the minimum of 1.
    #[error("forecast horizon must be at least 1, got {got}")]
    HorizonTooSmall { got: i64 },

    /// Forecast horizon above the supported maximum.
    #[error("forecast horizon must be at most {max}, got {got}")]
    HorizonTooLarge { got: usize, max: usize },

    /// Series too short for the specific method requested.
    #[error("method '{method}' requires at least {needed} periods, got {got}")]
    InsufficientPeriodsForMethod {
        method: &'static str,
        needed: usize,
        got: usize,
    },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Requested method name is not in the registry.
    #[error("unknown method '{name}', valid methods: {valid:?}")]
    UnknownMethod { name: String, valid: Vec<String> },

    /// Walk-forward validation produced no successful fold.
    #[error("no successful validation fold; series may be too short or degenerate")]
    NoSuccessfulValidation,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical computation failed.
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl ForecastError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyData => "EMPTY_SERIES",
            Self::MissingValues { .. } => "MISSING_VALUES",
            Self::InsufficientData { .. } => "SERIES_TOO_SHORT",
            Self::NegativeValues { .. } => "NEGATIVE_VALUES",
            Self::ZerosNotAllowed { .. } => "ZEROS_NOT_ALLOWED",
            Self::HorizonTooSmall { .. } => "HORIZON_TOO_SMALL",
            Self::HorizonTooLarge { .. } => "HORIZON_TOO_LARGE",
            Self::InsufficientPeriodsForMethod { .. } => "INSUFFICIENT_PERIODS",
            Self::FitRequired => "NOT_FITTED",
            Self::UnknownMethod { .. } => "UNKNOWN_METHOD",
            Self::NoSuccessfulValidation => "NO_VALID_FOLDS",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::ComputationError(_) => "COMPUTATION_ERROR",
        }
    }

    /// Actionable suggestion for the operator.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::EmptyData => "provide a series with at least one observation",
            Self::MissingValues { .. } => {
                "fill or drop the missing periods before forecasting; gaps are never coerced"
            }
            Self::InsufficientData { .. } => {
                "collect more history or pick a method with a lower minimum"
            }
            Self::NegativeValues { .. } => {
                "check the sales extraction; returns should be netted out upstream"
            }
            Self::ZerosNotAllowed { .. } => {
                "use the TSB or AUTO method, which expect intermittent (zero-heavy) demand"
            }
            Self::HorizonTooSmall { .. } => "request a horizon between 1 and 36 periods",
            Self::HorizonTooLarge { .. } => "request a horizon between 1 and 36 periods",
            Self::InsufficientPeriodsForMethod { .. } => {
                "use AUTO to fall back to a method compatible with the available history"
            }
            Self::FitRequired => "call fit() with the historical series before predict()",
            Self::UnknownMethod { .. } => "pick one of the listed method names or AUTO",
            Self::NoSuccessfulValidation => {
                "lower min_train_size, shorten the horizon, or inspect the series for degeneracy"
            }
            Self::InvalidParameter(_) => "review the parameter against its documented range",
            Self::ComputationError(_) => "inspect the series for degenerate values",
        }
    }
}
