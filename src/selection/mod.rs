//! Method selection: classify the demand pattern, recommend a method.
//!
//! Follows the same evidence-threshold-decision shape as the outlier and
//! seasonality detectors: compute statistics once, walk prioritized rules,
//! and always produce a reason string. When the history is long enough the
//! heuristic ranking is re-ranked by walk-forward WMAPE; candidates whose
//! evaluation fails keep their heuristic rank.

use crate::core::{DemandSeries, SeriesStatistics};
use crate::detection::{SeasonalityDetector, SeasonalityReport};
use crate::error::{ForecastError, Result};
use crate::evaluation::{walk_forward, WalkForwardConfig};
use crate::models::trend::ols_fit;
use crate::models::ForecastMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Demand pattern classes, in rule-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandPattern {
    /// Many zero periods; Croston-family territory.
    Intermittent,
    /// Significant periodic cycle with enough history to exploit it.
    Seasonal,
    /// Strong linear trend.
    Trending,
    /// High relative dispersion without structure.
    Volatile,
    /// Low dispersion, no trend, no cycle.
    Stable,
    /// Nothing decisive.
    Irregular,
}

impl DemandPattern {
    pub fn label(&self) -> &'static str {
        match self {
            DemandPattern::Intermittent => "intermittent",
            DemandPattern::Seasonal => "seasonal",
            DemandPattern::Trending => "trending",
            DemandPattern::Volatile => "volatile",
            DemandPattern::Stable => "stable",
            DemandPattern::Irregular => "irregular",
        }
    }
}

/// Outcome of [`MethodSelector::recommend`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRecommendation {
    pub method: ForecastMethod,
    /// 0 to 1 confidence in the primary recommendation.
    pub confidence: f64,
    pub reason: String,
    /// Remaining applicable methods with their suitability scores, best first.
    pub alternatives: Vec<(ForecastMethod, f64)>,
    /// The numeric evidence the decision was based on.
    pub characteristics: BTreeMap<String, f64>,
    pub pattern: DemandPattern,
}

const ZERO_FRACTION_INTERMITTENT: f64 = 0.3;
const R_SQUARED_TRENDING: f64 = 0.5;
const CV_VOLATILE: f64 = 0.6;
const CV_STABLE: f64 = 0.15;
const MIN_LENGTH_FOR_RERANK: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct MethodSelector {
    /// Skip the walk-forward re-ranking pass; heuristic scores only.
    pub heuristics_only: bool,
}

impl MethodSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `series` and recommend the best forecasting method.
    pub fn recommend(&self, series: &DemandSeries) -> Result<MethodRecommendation> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        let values = series.values();
        let stats = SeriesStatistics::from_values(values);
        let seasonality = SeasonalityDetector::new().detect(values);
        let (_, slope, r_squared) = ols_fit(values);

        let mut characteristics = BTreeMap::new();
        characteristics.insert("length".to_string(), stats.len as f64);
        characteristics.insert("mean".to_string(), stats.mean);
        characteristics.insert("cv".to_string(), stats.coefficient_of_variation);
        characteristics.insert("zero_fraction".to_string(), stats.zero_fraction);
        characteristics.insert("trend_slope".to_string(), slope);
        characteristics.insert("trend_r_squared".to_string(), r_squared);
        characteristics.insert("seasonal_strength".to_string(), seasonality.strength);
        characteristics.insert(
            "seasonal_period".to_string(),
            seasonality.seasonal_period.map_or(0.0, |p| p as f64),
        );

        let (pattern, reason) = classify(&stats, &seasonality, r_squared);
        let primary = primary_method(pattern);
        let confidence = confidence_score(pattern, &stats, &seasonality, r_squared);

        let mut ranked = self.rank_candidates(series, &stats, &seasonality, r_squared, pattern);
        // The classified primary leads regardless of score ties.
        ranked.retain(|(m, _)| *m != primary);

        tracing::debug!(
            series = series.id(),
            pattern = pattern.label(),
            method = primary.canonical_name(),
            confidence,
            "method recommended"
        );

        Ok(MethodRecommendation {
            method: primary,
            confidence,
            reason,
            alternatives: ranked,
            characteristics,
            pattern,
        })
    }

    /// Score every applicable concrete method, best first.
    fn rank_candidates(
        &self,
        series: &DemandSeries,
        stats: &SeriesStatistics,
        seasonality: &SeasonalityReport,
        r_squared: f64,
        pattern: DemandPattern,
    ) -> Vec<(ForecastMethod, f64)> {
        let mut scored: Vec<(ForecastMethod, f64)> = ForecastMethod::CONCRETE
            .iter()
            .filter(|m| series.len() >= m.min_length())
            .filter(|m| m.tolerates_zeros() || stats.zero_fraction < 1.0)
            .map(|&m| (m, suitability(m, stats, seasonality, r_squared, pattern)))
            .collect();

        if !self.heuristics_only && series.len() >= MIN_LENGTH_FOR_RERANK {
            let config = WalkForwardConfig::default();
            for (method, score) in &mut scored {
                match walk_forward(series, *method, &config) {
                    Ok(result) if result.is_computable() => {
                        // Map WMAPE onto (0, 1]: 0% error scores 1.0, 100% scores 0.5.
                        *score = 0.6 * (100.0 / (100.0 + result.wmape)) + 0.4 * *score;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(
                            method = method.canonical_name(),
                            error = %e,
                            "candidate evaluation failed, keeping heuristic score"
                        );
                    }
                }
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

/// Prioritized classification rules. Earlier rules win.
fn classify(
    stats: &SeriesStatistics,
    seasonality: &SeasonalityReport,
    r_squared: f64,
) -> (DemandPattern, String) {
    if stats.zero_fraction > ZERO_FRACTION_INTERMITTENT {
        return (
            DemandPattern::Intermittent,
            format!(
                "{:.0}% of periods have zero demand; intermittent-demand model recommended",
                stats.zero_fraction * 100.0
            ),
        );
    }
    if seasonality.has_seasonality && stats.len >= 24 {
        let period = seasonality.seasonal_period.unwrap_or(12);
        return (
            DemandPattern::Seasonal,
            format!(
                "significant seasonality with period {} (strength {:.2}); seasonal decomposition recommended",
                period, seasonality.strength
            ),
        );
    }
    if r_squared > R_SQUARED_TRENDING {
        return (
            DemandPattern::Trending,
            format!(
                "linear trend explains {:.0}% of variance; trend regression recommended",
                r_squared * 100.0
            ),
        );
    }
    if stats.coefficient_of_variation > CV_VOLATILE {
        return (
            DemandPattern::Volatile,
            format!(
                "high variability (CV {:.2}); exponential smoothing recommended",
                stats.coefficient_of_variation
            ),
        );
    }
    if stats.coefficient_of_variation < CV_STABLE {
        return (
            DemandPattern::Stable,
            format!(
                "stable demand (CV {:.2}); simple moving average recommended",
                stats.coefficient_of_variation
            ),
        );
    }
    (
        DemandPattern::Irregular,
        format!(
            "no dominant pattern (CV {:.2}, trend R² {:.2}); weighted moving average recommended",
            stats.coefficient_of_variation, r_squared
        ),
    )
}

fn primary_method(pattern: DemandPattern) -> ForecastMethod {
    match pattern {
        DemandPattern::Intermittent => ForecastMethod::Tsb,
        DemandPattern::Seasonal => ForecastMethod::SeasonalDecomposition,
        DemandPattern::Trending => ForecastMethod::TrendRegression,
        DemandPattern::Volatile => ForecastMethod::Ema,
        DemandPattern::Stable => ForecastMethod::Sma,
        DemandPattern::Irregular => ForecastMethod::Wma,
    }
}

/// Heuristic suitability of a method for the observed evidence, 0 to 1.
fn suitability(
    method: ForecastMethod,
    stats: &SeriesStatistics,
    seasonality: &SeasonalityReport,
    r_squared: f64,
    pattern: DemandPattern,
) -> f64 {
    let base = match method {
        ForecastMethod::Tsb => {
            if stats.zero_fraction > ZERO_FRACTION_INTERMITTENT {
                0.9
            } else {
                0.2 + stats.zero_fraction
            }
        }
        ForecastMethod::SeasonalDecomposition => {
            if seasonality.has_seasonality {
                0.5 + 0.5 * seasonality.strength
            } else {
                0.2
            }
        }
        ForecastMethod::TrendRegression => 0.3 + 0.6 * r_squared,
        ForecastMethod::Ema => {
            if stats.coefficient_of_variation > CV_VOLATILE {
                0.7
            } else {
                0.5
            }
        }
        ForecastMethod::Sma => {
            if stats.coefficient_of_variation < CV_STABLE {
                0.8
            } else {
                0.5
            }
        }
        ForecastMethod::Wma => 0.55,
        ForecastMethod::Auto => 0.0,
    };
    if method == primary_method(pattern) {
        (base + 0.1).min(1.0)
    } else {
        base.min(1.0)
    }
}

/// Evidence strength behind the classification, 0 to 1.
fn confidence_score(
    pattern: DemandPattern,
    stats: &SeriesStatistics,
    seasonality: &SeasonalityReport,
    r_squared: f64,
) -> f64 {
    let mut confidence: f64 = 0.5;
    match pattern {
        DemandPattern::Intermittent => {
            if stats.zero_fraction > 0.5 {
                confidence += 0.3;
            } else {
                confidence += 0.15;
            }
        }
        DemandPattern::Seasonal => {
            confidence += 0.4 * seasonality.strength.min(1.0);
            if seasonality.p_value < 0.05 {
                confidence += 0.1;
            }
        }
        DemandPattern::Trending => {
            confidence += 0.4 * (r_squared - R_SQUARED_TRENDING).max(0.0) / 0.5;
            if r_squared > 0.8 {
                confidence += 0.1;
            }
        }
        DemandPattern::Volatile => {
            confidence += 0.1;
        }
        DemandPattern::Stable => {
            confidence += 0.2;
            if stats.len >= 12 {
                confidence += 0.1;
            }
        }
        DemandPattern::Irregular => {
            confidence -= 0.1;
        }
    }
    if stats.len >= 24 {
        confidence += 0.05;
    } else if stats.len < 6 {
        confidence -= 0.15;
    }
    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: Vec<f64>) -> DemandSeries {
        DemandSeries::monthly("sku", values).unwrap()
    }

    fn selector() -> MethodSelector {
        MethodSelector {
            heuristics_only: true,
        }
    }

    #[test]
    fn intermittent_series_recommends_tsb() {
        let rec = selector()
            .recommend(&series(vec![
                0.0, 5.0, 0.0, 0.0, 3.0, 0.0, 0.0, 4.0, 0.0, 2.0, 0.0, 0.0,
            ]))
            .unwrap();
        assert_eq!(rec.pattern, DemandPattern::Intermittent);
        assert_eq!(rec.method, ForecastMethod::Tsb);
        assert!(rec.reason.contains("zero demand"));
    }

    #[test]
    fn trending_series_recommends_regression() {
        let values: Vec<f64> = (1..=15).map(|i| 10.0 * i as f64).collect();
        let rec = selector().recommend(&series(values)).unwrap();
        assert_eq!(rec.pattern, DemandPattern::Trending);
        assert_eq!(rec.method, ForecastMethod::TrendRegression);
        assert!(rec.confidence > 0.7);
    }

    #[test]
    fn stable_series_recommends_sma() {
        let rec = selector()
            .recommend(&series(vec![
                100.0, 102.0, 99.0, 101.0, 100.0, 103.0, 97.0, 102.0, 99.0, 100.0, 101.0, 98.0,
            ]))
            .unwrap();
        assert_eq!(rec.pattern, DemandPattern::Stable);
        assert_eq!(rec.method, ForecastMethod::Sma);
    }

    #[test]
    fn alternatives_exclude_primary_and_respect_min_lengths() {
        let rec = selector()
            .recommend(&series(vec![100.0, 101.0, 99.0, 100.0, 102.0]))
            .unwrap();
        assert!(rec.alternatives.iter().all(|(m, _)| *m != rec.method));
        // Length 5 rules out seasonal decomposition (needs 24).
        assert!(rec
            .alternatives
            .iter()
            .all(|(m, _)| *m != ForecastMethod::SeasonalDecomposition));
    }

    #[test]
    fn alternatives_are_sorted_best_first() {
        let rec = selector()
            .recommend(&series(vec![
                100.0, 102.0, 99.0, 101.0, 100.0, 103.0, 97.0, 102.0, 99.0, 100.0, 101.0, 98.0,
            ]))
            .unwrap();
        for pair in rec.alternatives.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn characteristics_carry_the_evidence() {
        let rec = selector()
            .recommend(&series(vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0]))
            .unwrap();
        assert!(rec.characteristics.contains_key("cv"));
        assert!(rec.characteristics.contains_key("zero_fraction"));
        assert!(rec.characteristics.contains_key("trend_r_squared"));
        assert_eq!(rec.characteristics["length"], 6.0);
    }

    #[test]
    fn empty_series_errors() {
        let empty = DemandSeries::monthly("sku", vec![]);
        // DemandSeries::monthly rejects empty input before the selector runs.
        assert!(empty.is_err());
    }

    #[test]
    fn rerank_keeps_heuristic_score_when_evaluation_fails() {
        // Short enough that the re-rank pass is skipped entirely.
        let rec = MethodSelector::new()
            .recommend(&series(vec![10.0, 11.0, 12.0, 11.0, 10.0]))
            .unwrap();
        assert!(!rec.alternatives.is_empty());
    }
}
