//! AUTO: the meta-model that picks one of the six concrete methods.
//!
//! Fit runs the selector, instantiates the recommended model and fits it.
//! If the primary fails to fit, the ranked alternatives are tried in order
//! and the substitution is recorded in the reason. Exactly one audit record
//! is written per fit call, success or failure.

use crate::audit::{AuditSink, SelectionRecord};
use crate::core::{DemandSeries, Forecast, SeriesStatistics};
use crate::detection::OutlierReport;
use crate::error::{ForecastError, Result};
use crate::models::{BoxedForecaster, ForecastMethod, Forecaster};
use crate::selection::{MethodRecommendation, MethodSelector};
use crate::validation::{validate, ValidationOptions};
use std::sync::Arc;

pub struct AutoSelector {
    sink: Arc<dyn AuditSink>,
    inner: Option<BoxedForecaster>,
    chosen: Option<ForecastMethod>,
    recommendation: Option<MethodRecommendation>,
}

impl AutoSelector {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            inner: None,
            chosen: None,
            recommendation: None,
        }
    }

    /// The concrete method fitted on the last successful call.
    pub fn chosen_method(&self) -> Option<ForecastMethod> {
        self.chosen
    }

    /// The selector's full output from the last successful fit.
    pub fn recommendation(&self) -> Option<&MethodRecommendation> {
        self.recommendation.as_ref()
    }

    fn audit(
        &self,
        series: &DemandSeries,
        method: ForecastMethod,
        confidence: f64,
        reason: String,
        recommendation: Option<&MethodRecommendation>,
        error: Option<&ForecastError>,
    ) {
        let record = SelectionRecord {
            series_id: Some(series.id().to_string()),
            method,
            confidence,
            reason,
            characteristics: recommendation
                .map(|r| r.characteristics.clone())
                .unwrap_or_default(),
            alternatives: recommendation
                .map(|r| r.alternatives.clone())
                .unwrap_or_default(),
            data_stats: SeriesStatistics::from_values(series.values()),
            success: error.is_none(),
            error: error.map(|e| e.to_string()),
        };
        self.sink.log_selection(&record);
    }
}

impl Forecaster for AutoSelector {
    fn fit(&mut self, series: &DemandSeries) -> Result<()> {
        let options = ValidationOptions {
            min_length: ForecastMethod::Auto.min_length(),
            allow_zeros: true,
            check_outliers: false,
        };
        if let Err(e) = validate(series, &options) {
            self.audit(
                series,
                ForecastMethod::Auto,
                0.0,
                "validation failed before selection".to_string(),
                None,
                Some(&e),
            );
            return Err(e);
        }

        let recommendation = match MethodSelector::new().recommend(series) {
            Ok(r) => r,
            Err(e) => {
                self.audit(
                    series,
                    ForecastMethod::Auto,
                    0.0,
                    "method selection failed".to_string(),
                    None,
                    Some(&e),
                );
                return Err(e);
            }
        };

        // Primary first, then ranked alternatives.
        let mut candidates = vec![recommendation.method];
        candidates.extend(recommendation.alternatives.iter().map(|(m, _)| *m));

        let mut last_error = ForecastError::NoSuccessfulValidation;
        for method in candidates {
            let mut model = method.create();
            match model.fit(series) {
                Ok(()) => {
                    let reason = if method == recommendation.method {
                        recommendation.reason.clone()
                    } else {
                        format!(
                            "{} (primary {} could not be fitted: {}; substituted {})",
                            recommendation.reason,
                            recommendation.method.canonical_name(),
                            last_error,
                            method.canonical_name()
                        )
                    };
                    self.audit(
                        series,
                        method,
                        recommendation.confidence,
                        reason,
                        Some(&recommendation),
                        None,
                    );
                    self.inner = Some(model);
                    self.chosen = Some(method);
                    self.recommendation = Some(recommendation);
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(
                        series = series.id(),
                        method = method.canonical_name(),
                        error = %e,
                        "candidate fit failed, trying next"
                    );
                    last_error = e;
                }
            }
        }

        self.audit(
            series,
            recommendation.method,
            recommendation.confidence,
            "no candidate method could be fitted".to_string(),
            Some(&recommendation),
            Some(&last_error),
        );
        Err(last_error)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let inner = self.inner.as_ref().ok_or(ForecastError::FitRequired)?;
        inner.predict(horizon)
    }

    fn name(&self) -> &str {
        "AUTO"
    }

    fn is_fitted(&self) -> bool {
        self.inner.is_some()
    }

    fn outlier_report(&self) -> Option<&OutlierReport> {
        self.inner.as_ref().and_then(|m| m.outlier_report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;

    fn series(values: Vec<f64>) -> DemandSeries {
        DemandSeries::monthly("sku", values).unwrap()
    }

    #[test]
    fn fits_the_recommended_method_and_audits_once() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mut auto = AutoSelector::new(Arc::clone(&sink) as Arc<dyn AuditSink>);
        auto.fit(&series(vec![
            100.0, 102.0, 99.0, 101.0, 100.0, 103.0, 97.0, 102.0, 99.0, 100.0, 101.0, 98.0,
        ]))
        .unwrap();
        assert!(auto.is_fitted());
        assert!(auto.chosen_method().is_some());
        assert_eq!(sink.len(), 1);
        assert!(sink.records()[0].success);
    }

    #[test]
    fn intermittent_series_routes_to_tsb() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mut auto = AutoSelector::new(Arc::clone(&sink) as Arc<dyn AuditSink>);
        auto.fit(&series(vec![
            0.0, 5.0, 0.0, 0.0, 3.0, 0.0, 0.0, 4.0, 0.0, 2.0, 0.0, 0.0,
        ]))
        .unwrap();
        assert_eq!(auto.chosen_method(), Some(ForecastMethod::Tsb));
        let forecast = auto.predict(3).unwrap();
        assert!(forecast.values().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn all_zero_series_succeeds_with_zero_forecast() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mut auto = AutoSelector::new(Arc::clone(&sink) as Arc<dyn AuditSink>);
        auto.fit(&series(vec![0.0; 8])).unwrap();
        let forecast = auto.predict(4).unwrap();
        assert!(forecast.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn validation_failure_is_audited_as_failure() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mut auto = AutoSelector::new(Arc::clone(&sink) as Arc<dyn AuditSink>);
        let err = auto.fit(&series(vec![100.0, 101.0])).unwrap_err();
        assert_eq!(err.code(), "SERIES_TOO_SHORT");
        assert_eq!(sink.len(), 1);
        assert!(!sink.records()[0].success);
        assert!(sink.records()[0].error.is_some());
    }

    #[test]
    fn predict_before_fit_errors() {
        let auto = AutoSelector::new(Arc::new(MemoryAuditSink::new()));
        assert!(matches!(
            auto.predict(3).unwrap_err(),
            ForecastError::FitRequired
        ));
    }
}
