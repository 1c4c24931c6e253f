//! Automatic outlier detection and treatment.
//!
//! The detector runs a sequential decision policy: first decide whether the
//! series warrants detection at all, then pick the detection method (IQR or
//! Z-score), then pick a treatment (remove or replace by median). Every
//! decision carries a human-readable reason. The detector never errors; on
//! any degenerate input it falls back to a "no outliers" report.

use crate::core::SeriesStatistics;
use serde::{Deserialize, Serialize};

/// Which statistical test flagged the outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// Interquartile range with multiplier 1.5; distribution-agnostic.
    Iqr,
    /// Standard-deviation distance from the mean, threshold 3.0.
    ZScore,
}

impl DetectionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            DetectionMethod::Iqr => "IQR",
            DetectionMethod::ZScore => "z-score",
        }
    }
}

/// Treatment applied to the flagged points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlierTreatment {
    /// Nothing detected or detection skipped.
    None,
    /// Flagged points removed; shortens the series.
    Remove,
    /// Flagged points replaced by the median of the remaining points;
    /// preserves length.
    ReplaceMedian,
}

/// Outcome of outlier analysis: what was flagged, how, and what was done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierReport {
    /// Indices of flagged points in the original series.
    pub indices: Vec<usize>,
    /// Detection method used, when detection ran.
    pub method: Option<DetectionMethod>,
    pub treatment: OutlierTreatment,
    /// Original values at the flagged indices.
    pub original_values: Vec<f64>,
    /// Replacement values, index-aligned with `indices`; empty when removed.
    pub replacement_values: Vec<f64>,
    /// Series after treatment.
    pub cleaned_values: Vec<f64>,
    /// Confidence in the analysis, 0 to 1.
    pub confidence: f64,
    pub reason: String,
}

impl OutlierReport {
    pub fn has_outliers(&self) -> bool {
        !self.indices.is_empty()
    }

    fn untouched(values: &[f64], reason: impl Into<String>) -> Self {
        Self {
            indices: Vec::new(),
            method: None,
            treatment: OutlierTreatment::None,
            original_values: Vec::new(),
            replacement_values: Vec::new(),
            cleaned_values: values.to_vec(),
            confidence: 0.5,
            reason: reason.into(),
        }
    }
}

/// IQR threshold constant: the classical 1.5 multiplier.
const IQR_MULTIPLIER: f64 = 1.5;
/// Z-score threshold constant.
const Z_THRESHOLD: f64 = 3.0;

/// Stateless outlier detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlierDetector;

impl OutlierDetector {
    pub fn new() -> Self {
        Self
    }

    /// Analyze a series and, when warranted, produce a cleaned copy.
    ///
    /// Pure: the input is never mutated. Never errors; degenerate inputs
    /// produce a "no outliers" report.
    pub fn analyze_and_clean(&self, values: &[f64]) -> OutlierReport {
        let stats = SeriesStatistics::from_values(values);

        let Some(detect_reason) = should_detect(&stats, values) else {
            return OutlierReport::untouched(
                values,
                skip_reason(&stats),
            );
        };

        let method = choose_method(&stats);
        let indices = match method {
            DetectionMethod::Iqr => detect_iqr(values),
            DetectionMethod::ZScore => detect_z_score(values),
        };

        if indices.is_empty() {
            return OutlierReport::untouched(
                values,
                format!("{}; no outliers found by {}", detect_reason, method.label()),
            );
        }

        let fraction = indices.len() as f64 / values.len() as f64;
        let treatment = choose_treatment(fraction, values.len());
        let original_values: Vec<f64> = indices.iter().map(|&i| values[i]).collect();

        let (cleaned_values, replacement_values) = apply_treatment(values, &indices, treatment);

        let confidence = confidence_score(&stats, fraction);
        let reason = format!(
            "{}; {} outlier(s) flagged by {} ({:.1}% of series), treatment: {:?}",
            detect_reason,
            indices.len(),
            method.label(),
            fraction * 100.0,
            treatment
        );

        OutlierReport {
            indices,
            method: Some(method),
            treatment,
            original_values,
            replacement_values,
            cleaned_values,
            confidence,
            reason,
        }
    }
}

/// Decide whether detection is warranted. Order matters; each rule
/// short-circuits. Returns the triggering evidence, or None to skip.
fn should_detect(stats: &SeriesStatistics, values: &[f64]) -> Option<String> {
    if stats.len < 6 {
        return None;
    }
    if stats.zero_fraction > 0.30 {
        return None;
    }
    // Heavy tails take priority over the low-variability skip below: a
    // stable-looking series can still carry extreme spikes.
    if stats.skewness.abs() > 1.5 || stats.kurtosis > 3.0 {
        return Some(format!(
            "heavy-tailed distribution (skewness {:.2}, kurtosis {:.2})",
            stats.skewness, stats.kurtosis
        ));
    }
    if stats.coefficient_of_variation < 0.15 {
        return None;
    }
    let beyond_2_sigma = values
        .iter()
        .filter(|&&v| v > stats.mean + 2.0 * stats.std_dev)
        .count() as f64
        / stats.len as f64;
    if beyond_2_sigma > 0.10 {
        return Some(format!(
            "{:.1}% of points beyond mean+2σ",
            beyond_2_sigma * 100.0
        ));
    }
    if stats.relative_range() > 2.5 {
        return Some(format!("relative range {:.2} exceeds 2.5", stats.relative_range()));
    }
    if stats.coefficient_of_variation > 0.4 && stats.zero_fraction < 0.30 {
        return Some(format!(
            "high variability (CV {:.2}) without intermittency",
            stats.coefficient_of_variation
        ));
    }
    None
}

fn skip_reason(stats: &SeriesStatistics) -> String {
    if stats.len < 6 {
        "series too short for outlier detection (< 6 periods)".to_string()
    } else if stats.zero_fraction > 0.30 {
        format!(
            "intermittent demand ({:.0}% zeros); zeros are not outliers",
            stats.zero_fraction * 100.0
        )
    } else if stats.coefficient_of_variation < 0.15 {
        format!(
            "series too stable (CV {:.2}) for outliers to matter",
            stats.coefficient_of_variation
        )
    } else {
        "no evidence of outliers".to_string()
    }
}

/// IQR for skewed/heavy-tailed/short series; Z-score otherwise.
fn choose_method(stats: &SeriesStatistics) -> DetectionMethod {
    if stats.skewness.abs() > 1.0 || stats.kurtosis > 3.0 || stats.len < 12 {
        DetectionMethod::Iqr
    } else {
        DetectionMethod::ZScore
    }
}

fn choose_treatment(fraction: f64, len: usize) -> OutlierTreatment {
    if fraction > 0.20 {
        // Removing this many points would shorten the series too much.
        OutlierTreatment::ReplaceMedian
    } else if fraction < 0.10 && len > 12 {
        OutlierTreatment::Remove
    } else {
        // 10-20% fraction, or a short series.
        OutlierTreatment::ReplaceMedian
    }
}

fn apply_treatment(
    values: &[f64],
    indices: &[usize],
    treatment: OutlierTreatment,
) -> (Vec<f64>, Vec<f64>) {
    match treatment {
        OutlierTreatment::None => (values.to_vec(), Vec::new()),
        OutlierTreatment::Remove => {
            let cleaned: Vec<f64> = values
                .iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .map(|(_, &v)| v)
                .collect();
            (cleaned, Vec::new())
        }
        OutlierTreatment::ReplaceMedian => {
            let kept: Vec<f64> = values
                .iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .map(|(_, &v)| v)
                .collect();
            let replacement = median(&kept);
            let cleaned: Vec<f64> = values
                .iter()
                .enumerate()
                .map(|(i, &v)| if indices.contains(&i) { replacement } else { v })
                .collect();
            (cleaned, vec![replacement; indices.len()])
        }
    }
}

/// Confidence in the analysis: base 0.5 adjusted by fraction, tail weight
/// and sample size, clamped to [0, 1].
fn confidence_score(stats: &SeriesStatistics, fraction: f64) -> f64 {
    let mut score: f64 = 0.5;
    if fraction < 0.05 {
        score += 0.2;
    } else if fraction > 0.25 {
        score -= 0.1;
    }
    if stats.skewness.abs() > 2.0 || stats.kurtosis > 5.0 {
        score += 0.2;
    }
    if stats.len >= 24 {
        score += 0.1;
    } else if stats.len < 6 {
        score -= 0.2;
    }
    score.clamp(0.0, 1.0)
}

fn detect_iqr(values: &[f64]) -> Vec<usize> {
    let q1 = quantile(values, 0.25);
    let q3 = quantile(values, 0.75);
    let iqr = q3 - q1;
    if !iqr.is_finite() {
        return Vec::new();
    }
    let lower = q1 - IQR_MULTIPLIER * iqr;
    let upper = q3 + IQR_MULTIPLIER * iqr;
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v < lower || v > upper)
        .map(|(i, _)| i)
        .collect()
}

fn detect_z_score(values: &[f64]) -> Vec<usize> {
    let stats = SeriesStatistics::from_values(values);
    if stats.std_dev < 1e-10 {
        return Vec::new();
    }
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| ((v - stats.mean) / stats.std_dev).abs() > Z_THRESHOLD)
        .map(|(i, _)| i)
        .collect()
}

/// Linear-interpolation quantile.
fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    quantile(values, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spiky_series() -> Vec<f64> {
        // 23 stable points plus one extreme spike.
        let mut values = vec![
            100.0, 102.0, 99.0, 101.0, 100.0, 103.0, 97.0, 102.0, 99.0, 100.0, 101.0, 98.0,
            100.0, 102.0, 99.0, 101.0, 100.0, 103.0, 97.0, 102.0, 99.0, 100.0, 101.0,
        ];
        values.push(500.0);
        values
    }

    #[test]
    fn short_series_is_skipped() {
        let report = OutlierDetector::new().analyze_and_clean(&[1.0, 2.0, 100.0]);
        assert!(!report.has_outliers());
        assert_eq!(report.treatment, OutlierTreatment::None);
        assert_eq!(report.cleaned_values, vec![1.0, 2.0, 100.0]);
    }

    #[test]
    fn intermittent_series_is_skipped() {
        // 40% zeros: zeros are demand gaps, not outliers.
        let values = vec![0.0, 5.0, 0.0, 6.0, 0.0, 5.0, 0.0, 7.0, 5.0, 6.0];
        let report = OutlierDetector::new().analyze_and_clean(&values);
        assert!(!report.has_outliers());
        assert!(report.reason.contains("intermittent"));
    }

    #[test]
    fn stable_series_is_skipped() {
        let values = vec![100.0, 101.0, 99.0, 100.0, 102.0, 98.0, 100.0, 101.0];
        let report = OutlierDetector::new().analyze_and_clean(&values);
        assert!(!report.has_outliers());
        assert!(report.reason.contains("stable"));
    }

    #[test]
    fn skew_rule_overrides_low_cv_skip() {
        // Very stable base with one moderate spike: CV stays under the 0.15
        // skip threshold, but the skewness rule has priority and must still
        // trigger detection.
        let mut values = vec![
            100.0, 100.5, 99.5, 100.0, 100.5, 99.5, 100.0, 100.5, 99.5, 100.0, 100.5, 99.5,
            100.0, 100.5, 99.5, 100.0, 100.5, 99.5, 100.0, 100.5, 99.5, 100.0, 100.5,
        ];
        values.push(110.0);
        let stats = SeriesStatistics::from_values(&values);
        assert!(
            stats.coefficient_of_variation < 0.15,
            "precondition: CV {}",
            stats.coefficient_of_variation
        );
        assert!(stats.skewness > 1.5, "precondition: skewness {}", stats.skewness);

        let report = OutlierDetector::new().analyze_and_clean(&values);
        assert!(report.has_outliers());
        assert!(report.indices.contains(&23));
    }

    #[test]
    fn heavy_tail_selects_iqr() {
        let report = OutlierDetector::new().analyze_and_clean(&spiky_series());
        assert_eq!(report.method, Some(DetectionMethod::Iqr));
    }

    #[test]
    fn small_fraction_on_long_series_removes() {
        let values = spiky_series();
        let report = OutlierDetector::new().analyze_and_clean(&values);
        // 1 of 24 points is ~4%: remove, strictly shortening the series.
        assert_eq!(report.treatment, OutlierTreatment::Remove);
        assert_eq!(report.cleaned_values.len(), values.len() - report.indices.len());
        assert!(report.replacement_values.is_empty());
    }

    #[test]
    fn short_series_replaces_by_median() {
        // 10 points with a clear spike: short series, replace by median.
        let values = vec![10.0, 11.0, 9.0, 10.0, 12.0, 200.0, 10.0, 11.0, 9.0, 10.0];
        let report = OutlierDetector::new().analyze_and_clean(&values);
        assert!(report.has_outliers());
        assert_eq!(report.treatment, OutlierTreatment::ReplaceMedian);
        assert_eq!(report.cleaned_values.len(), values.len());

        // Replacement is the median of the non-flagged points.
        let expected = median(&[10.0, 11.0, 9.0, 10.0, 12.0, 10.0, 11.0, 9.0, 10.0]);
        assert_relative_eq!(report.replacement_values[0], expected, epsilon = 1e-12);
        assert_relative_eq!(report.cleaned_values[5], expected, epsilon = 1e-12);
    }

    #[test]
    fn original_values_are_recorded() {
        let values = spiky_series();
        let report = OutlierDetector::new().analyze_and_clean(&values);
        assert_eq!(report.original_values, vec![500.0]);
    }

    #[test]
    fn treatment_never_lengthens_the_series() {
        let cases = vec![
            spiky_series(),
            vec![10.0, 11.0, 9.0, 10.0, 12.0, 200.0, 10.0, 11.0, 9.0, 10.0],
            vec![5.0; 30],
        ];
        for values in cases {
            let report = OutlierDetector::new().analyze_and_clean(&values);
            assert!(report.cleaned_values.len() <= values.len());
            match report.treatment {
                OutlierTreatment::Remove => {
                    assert!(report.cleaned_values.len() < values.len())
                }
                OutlierTreatment::ReplaceMedian | OutlierTreatment::None => {
                    assert_eq!(report.cleaned_values.len(), values.len())
                }
            }
        }
    }

    #[test]
    fn rerun_on_cleaned_series_finds_nothing_new() {
        let report = OutlierDetector::new().analyze_and_clean(&spiky_series());
        let second = OutlierDetector::new().analyze_and_clean(&report.cleaned_values);
        assert!(!second.has_outliers(), "second pass: {:?}", second.indices);
    }

    #[test]
    fn constant_series_falls_back_to_no_outliers() {
        let report = OutlierDetector::new().analyze_and_clean(&[7.0; 20]);
        assert!(!report.has_outliers());
        assert_eq!(report.treatment, OutlierTreatment::None);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        let inputs = vec![
            spiky_series(),
            vec![0.0; 10],
            vec![1.0, 2.0],
            (0..50).map(|i| (i as f64 * 1.7).sin().abs() * 100.0).collect::<Vec<_>>(),
        ];
        for values in inputs {
            let report = OutlierDetector::new().analyze_and_clean(&values);
            assert!((0.0..=1.0).contains(&report.confidence));
        }
    }

    #[test]
    fn quantile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&values, 0.5), 2.5, epsilon = 1e-12);
        assert_relative_eq!(quantile(&values, 0.25), 1.75, epsilon = 1e-12);
        assert_relative_eq!(quantile(&values, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(quantile(&values, 1.0), 4.0, epsilon = 1e-12);
    }
}
