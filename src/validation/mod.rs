//! Input validation for demand series and forecast requests.
//!
//! Hard violations fail fast with a typed error (stable code + suggestion);
//! outlier detection, when requested, is attached as a warning and never
//! blocks downstream use.

use crate::core::{DemandSeries, SeriesStatistics};
use crate::detection::{OutlierDetector, OutlierReport};
use crate::error::{ForecastError, Result};
use crate::models::ForecastMethod;
use serde::{Deserialize, Serialize};

/// Maximum forecast horizon in periods (three years of monthly buckets).
pub const MAX_HORIZON: usize = 36;

/// Options controlling series validation.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Minimum acceptable length.
    pub min_length: usize,
    /// Whether zero demand periods are acceptable.
    pub allow_zeros: bool,
    /// Whether to scan for outliers (warning only, never a hard failure).
    pub check_outliers: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            min_length: 3,
            allow_zeros: true,
            check_outliers: false,
        }
    }
}

/// Result of a successful validation: diagnostics for downstream components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub stats: SeriesStatistics,
    pub warnings: Vec<String>,
    /// Present when outlier checking was requested.
    pub outlier_report: Option<OutlierReport>,
}

/// Validate a series against the given options.
///
/// Hard violations are checked in a fixed order and the first one found is
/// returned: missing values, length, negatives, zeros. Statistics are always
/// computed on success for downstream diagnostics.
pub fn validate(series: &DemandSeries, options: &ValidationOptions) -> Result<ValidationReport> {
    let values = series.values();
    if values.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    // Missing values (NaN/Inf sentinel) are never silently coerced.
    let missing: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_finite())
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(ForecastError::MissingValues { indices: missing });
    }

    if values.len() < options.min_length {
        return Err(ForecastError::InsufficientData {
            needed: options.min_length,
            got: values.len(),
        });
    }

    let negatives: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v < 0.0)
        .map(|(i, _)| i)
        .collect();
    if !negatives.is_empty() {
        return Err(ForecastError::NegativeValues {
            count: negatives.len(),
            sample_indices: negatives.into_iter().take(5).collect(),
        });
    }

    if !options.allow_zeros {
        let zero_count = values.iter().filter(|&&v| v == 0.0).count();
        if zero_count > 0 {
            return Err(ForecastError::ZerosNotAllowed { count: zero_count });
        }
    }

    let stats = SeriesStatistics::from_values(values);
    let mut warnings = Vec::new();
    let mut outlier_report = None;

    if options.check_outliers {
        let report = OutlierDetector::new().analyze_and_clean(values);
        if report.has_outliers() {
            warnings.push(format!(
                "{} potential outlier(s) detected: {}",
                report.indices.len(),
                report.reason
            ));
        }
        outlier_report = Some(report);
    }

    if stats.zero_fraction > 0.5 {
        warnings.push(format!(
            "series is highly intermittent ({:.0}% zeros); consider the TSB method",
            stats.zero_fraction * 100.0
        ));
    }

    Ok(ValidationReport {
        stats,
        warnings,
        outlier_report,
    })
}

/// Validate a full forecast request: series content, horizon range and the
/// requested method's own minimum history.
///
/// Zero tolerance is relaxed for intermittent-demand and AUTO methods, where
/// zeros are expected.
pub fn validate_forecast_inputs(
    series: &DemandSeries,
    horizon: usize,
    method: ForecastMethod,
) -> Result<ValidationReport> {
    if horizon < 1 {
        return Err(ForecastError::HorizonTooSmall { got: horizon as i64 });
    }
    if horizon > MAX_HORIZON {
        return Err(ForecastError::HorizonTooLarge {
            got: horizon,
            max: MAX_HORIZON,
        });
    }

    if series.len() < method.min_length() {
        return Err(ForecastError::InsufficientPeriodsForMethod {
            method: method.canonical_name(),
            needed: method.min_length(),
            got: series.len(),
        });
    }

    validate(
        series,
        &ValidationOptions {
            min_length: method.min_length(),
            allow_zeros: method.tolerates_zeros(),
            check_outliers: false,
        },
    )
}
