//! Seasonal periodicity detection.
//!
//! Tests a length-dependent list of candidate periods, decomposes the series
//! for each, scores them by seasonal strength, and applies a significance
//! test (one-way ANOVA over the period groups). Stronger patterns are
//! accepted with looser significance because ANOVA has low power with few
//! cycles. A mod-12 "visual" heuristic acts as a last-resort confirmation for
//! borderline strengths.

use crate::detection::decomposition::additive_decompose;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Outcome of seasonality detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalityReport {
    pub has_seasonality: bool,
    /// Detected period; None when no significant seasonality.
    pub seasonal_period: Option<usize>,
    /// Variance-explained ratio of the best candidate, 0 to 1.
    pub strength: f64,
    /// ANOVA p-value of the best candidate.
    pub p_value: f64,
    /// Confidence in the decision, 0 to 1.
    pub confidence: f64,
    /// "decomposition_anova" or "visual_heuristic".
    pub method: String,
    pub reason: String,
    /// Centered seasonal index per position; present only when significant.
    pub seasonal_indices: Option<Vec<f64>>,
}

impl SeasonalityReport {
    fn none(reason: impl Into<String>, confidence: f64) -> Self {
        Self {
            has_seasonality: false,
            seasonal_period: None,
            strength: 0.0,
            p_value: 1.0,
            confidence,
            method: "decomposition_anova".to_string(),
            reason: reason.into(),
            seasonal_indices: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    period: usize,
    strength: f64,
    p_value: f64,
    indices: Vec<f64>,
}

/// Minimum series length for detection to run at all.
const MIN_LENGTH: usize = 8;

/// Stateless seasonality detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonalityDetector;

impl SeasonalityDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the best seasonal period, if any. Never errors; decomposition
    /// failures for individual candidates are skipped.
    pub fn detect(&self, values: &[f64]) -> SeasonalityReport {
        let n = values.len();
        if n < MIN_LENGTH {
            return SeasonalityReport::none(
                format!("insufficient data for seasonality detection ({} < {})", n, MIN_LENGTH),
                0.5,
            );
        }

        let mut candidates = Vec::new();
        for period in candidate_periods(n) {
            match test_candidate(values, period) {
                Some(c) => candidates.push(c),
                None => {
                    tracing::debug!(period, "decomposition failed for candidate period");
                }
            }
        }

        if candidates.is_empty() {
            return SeasonalityReport::none("decomposition failed for all candidate periods", 0.5);
        }

        // Strongest first; smaller period wins ties.
        candidates.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.period.cmp(&b.period))
        });
        let runner_up_strength = candidates.get(1).map(|c| c.strength).unwrap_or(0.0);

        // Prefer the fundamental period: if the winner is an exact multiple
        // of a nearly-as-strong shorter candidate, pick the shorter one.
        let mut best = candidates[0].clone();
        if let Some(fundamental) = candidates
            .iter()
            .filter(|c| {
                c.period < best.period
                    && best.period % c.period == 0
                    && c.strength >= best.strength * 0.9
            })
            .min_by_key(|c| c.period)
        {
            best = fundamental.clone();
        }

        let (accepted, via_heuristic) = significance_decision(&best, values);

        // The heuristic tests an annual month pattern; report the period-12
        // candidate when it was actually tested.
        if via_heuristic {
            if let Some(annual) = candidates.iter().find(|c| c.period == 12) {
                best = annual.clone();
            }
        }

        let confidence = confidence_score(&best, runner_up_strength);
        let method = if via_heuristic {
            "visual_heuristic"
        } else {
            "decomposition_anova"
        };

        if accepted {
            SeasonalityReport {
                has_seasonality: true,
                seasonal_period: Some(best.period),
                strength: best.strength,
                p_value: best.p_value,
                confidence,
                method: method.to_string(),
                reason: format!(
                    "period {} accepted (strength {:.2}, p {:.3}, via {})",
                    best.period, best.strength, best.p_value, method
                ),
                seasonal_indices: Some(best.indices),
            }
        } else {
            SeasonalityReport {
                has_seasonality: false,
                seasonal_period: None,
                strength: best.strength,
                p_value: best.p_value,
                confidence,
                method: "decomposition_anova".to_string(),
                reason: format!(
                    "best candidate period {} rejected (strength {:.2}, p {:.3})",
                    best.period, best.strength, best.p_value
                ),
                seasonal_indices: None,
            }
        }
    }
}

/// Candidate seasonal periods for a series of length `n`, ascending.
fn candidate_periods(n: usize) -> Vec<usize> {
    let mut periods = Vec::new();
    if n >= 4 {
        periods.push(2); // bimonthly
    }
    if n >= 8 {
        periods.push(4); // quarterly
    }
    if n >= 12 {
        periods.push(6); // semestral
    }
    if n >= 14 {
        periods.push(7); // weekly
    }
    if n >= 24 {
        periods.push(12); // monthly/annual
    }
    if n >= 28 {
        periods.push(14); // biweekly
    }
    periods
}

fn test_candidate(values: &[f64], period: usize) -> Option<Candidate> {
    let decomposition = additive_decompose(values, period).ok()?;
    let strength = decomposition.seasonal_strength();
    let p_value = anova_p_value(values, period);
    Some(Candidate {
        period,
        strength,
        p_value,
        indices: decomposition.seasonal_indices,
    })
}

/// One-way ANOVA across the `period` groups formed by index mod period.
///
/// Degenerate layouts (fewer than 2 groups, any group with fewer than 2
/// observations) and NaN statistics are treated as "not significant"
/// (p = 1.0).
fn anova_p_value(values: &[f64], period: usize) -> f64 {
    let n = values.len();
    if period < 2 {
        return 1.0;
    }

    let mut groups: Vec<Vec<f64>> = vec![Vec::new(); period];
    for (i, &v) in values.iter().enumerate() {
        groups[i % period].push(v);
    }
    groups.retain(|g| !g.is_empty());

    if groups.len() < 2 || groups.iter().any(|g| g.len() < 2) {
        return 1.0;
    }

    let k = groups.len();
    let grand_mean = values.iter().sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in &groups {
        let group_mean = group.iter().sum::<f64>() / group.len() as f64;
        ss_between += group.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    if df_within <= 0.0 {
        return 1.0;
    }

    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;
    if ms_within < 1e-12 {
        // Identical values within groups: either a perfect pattern or a
        // constant series; the F statistic is undefined either way.
        return 1.0;
    }

    let f_stat = ms_between / ms_within;
    if !f_stat.is_finite() {
        return 1.0;
    }

    match FisherSnedecor::new(df_between, df_within) {
        Ok(dist) => {
            let p = 1.0 - dist.cdf(f_stat);
            if p.is_nan() {
                1.0
            } else {
                p.clamp(0.0, 1.0)
            }
        }
        Err(_) => 1.0,
    }
}

/// Strength-dependent significance thresholds. Returns (accepted,
/// via_visual_heuristic).
fn significance_decision(candidate: &Candidate, values: &[f64]) -> (bool, bool) {
    let s = candidate.strength;
    let p = candidate.p_value;
    let short_period = candidate.period <= 6;

    if s > 0.5 {
        (p < 0.20, false)
    } else if s > 0.3 {
        let threshold = if short_period { 0.15 } else { 0.10 };
        (p < threshold, false)
    } else if s > 0.2 {
        let threshold = if short_period { 0.10 } else { 0.05 };
        if p < threshold {
            (true, false)
        } else if visual_heuristic(values) {
            (true, true)
        } else {
            (false, false)
        }
    } else if s > 0.15 {
        // Only the visual heuristic can confirm this weak a pattern.
        if visual_heuristic(values) {
            (true, true)
        } else {
            (false, false)
        }
    } else {
        (false, false)
    }
}

/// Annual month-pattern heuristic: the three weakest and three strongest
/// month positions must both deviate from the overall mean by more than 15%.
fn visual_heuristic(values: &[f64]) -> bool {
    if values.len() < 12 {
        return false;
    }

    let mut sums = vec![0.0; 12];
    let mut counts = vec![0usize; 12];
    for (i, &v) in values.iter().enumerate() {
        sums[i % 12] += v;
        counts[i % 12] += 1;
    }

    let averages: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .filter(|(_, &c)| c > 0)
        .map(|(&s, &c)| s / c as f64)
        .collect();
    if averages.len() < 8 {
        return false;
    }

    let overall = values.iter().sum::<f64>() / values.len() as f64;
    if overall.abs() < 1e-10 {
        return false;
    }

    let mut sorted = averages.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let low_mean = sorted[..3].iter().sum::<f64>() / 3.0;
    let high_mean = sorted[sorted.len() - 3..].iter().sum::<f64>() / 3.0;

    low_mean < overall * 0.85 && high_mean > overall * 1.15
}

/// Confidence: base 0.5 plus strength, significance and separation bonuses.
fn confidence_score(best: &Candidate, runner_up_strength: f64) -> f64 {
    let mut score: f64 = 0.5;
    if best.strength > 0.7 {
        score += 0.3;
    } else if best.strength > 0.5 {
        score += 0.2;
    } else if best.strength > 0.3 {
        score += 0.1;
    }
    if best.p_value < 0.01 {
        score += 0.2;
    } else if best.p_value < 0.05 {
        score += 0.1;
    }
    if best.strength - runner_up_strength > 0.2 {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_series(n: usize, period: usize, amplitude: f64, noise: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * i as f64 / period as f64;
                let jitter = ((i * 7919) % 13) as f64 / 13.0 - 0.5;
                100.0 + amplitude * phase.sin() + noise * jitter
            })
            .collect()
    }

    #[test]
    fn short_series_reports_no_seasonality() {
        let report = SeasonalityDetector::new().detect(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(!report.has_seasonality);
        assert!(report.seasonal_period.is_none());
        assert!(report.reason.contains("insufficient"));
    }

    #[test]
    fn candidate_list_grows_with_length() {
        assert_eq!(candidate_periods(8), vec![2, 4]);
        assert_eq!(candidate_periods(13), vec![2, 4, 6]);
        assert_eq!(candidate_periods(14), vec![2, 4, 6, 7]);
        assert_eq!(candidate_periods(24), vec![2, 4, 6, 7, 12]);
        assert_eq!(candidate_periods(30), vec![2, 4, 6, 7, 12, 14]);
    }

    #[test]
    fn detects_weekly_pattern() {
        let values = seasonal_series(56, 7, 25.0, 2.0);
        let report = SeasonalityDetector::new().detect(&values);

        assert!(report.has_seasonality, "reason: {}", report.reason);
        assert_eq!(report.seasonal_period, Some(7));
        assert!(report.strength > 0.5);
        assert!(report.seasonal_indices.is_some());
        assert_eq!(report.seasonal_indices.unwrap().len(), 7);
    }

    #[test]
    fn detects_annual_pattern_in_monthly_data() {
        let values = seasonal_series(48, 12, 30.0, 3.0);
        let report = SeasonalityDetector::new().detect(&values);

        assert!(report.has_seasonality, "reason: {}", report.reason);
        assert_eq!(report.seasonal_period, Some(12));
    }

    #[test]
    fn flat_series_has_no_seasonality() {
        let report = SeasonalityDetector::new().detect(&[80.0; 36]);
        assert!(!report.has_seasonality);
        assert!(report.seasonal_period.is_none());
    }

    #[test]
    fn noisy_series_is_rejected() {
        // Pseudo-random noise built from two co-prime modular streams so no
        // candidate period (2, 4, 6, 7, 12, 14) aligns with an artifact, and
        // mild enough that month-group averages stay within 15% of the
        // overall mean.
        let values: Vec<f64> = (0..48usize)
            .map(|i| {
                let scrambled = ((i * 37 + 11) % 31) * ((i * 17 + 5) % 29) % 53;
                100.0 + scrambled as f64 / 53.0 * 20.0 - 10.0
            })
            .collect();
        let report = SeasonalityDetector::new().detect(&values);
        assert!(!report.has_seasonality, "reason: {}", report.reason);
    }

    #[test]
    fn period_is_always_a_tested_candidate() {
        for n in [8, 14, 24, 30, 52] {
            let values = seasonal_series(n, 7, 20.0, 1.0);
            let report = SeasonalityDetector::new().detect(&values);
            if report.has_seasonality {
                let period = report.seasonal_period.unwrap();
                assert!(
                    candidate_periods(n).contains(&period),
                    "period {} not a candidate for n={}",
                    period,
                    n
                );
                assert!(report.strength > 0.0 && report.strength <= 1.0);
            } else {
                assert!(report.seasonal_period.is_none());
            }
        }
    }

    #[test]
    fn anova_degenerate_groups_are_not_significant() {
        // Constant series: within-group variance is zero.
        assert_eq!(anova_p_value(&[5.0; 24], 12), 1.0);
        // Too few observations per group.
        assert_eq!(anova_p_value(&[1.0, 2.0, 3.0], 2), 1.0);
    }

    #[test]
    fn anova_finds_strong_monthly_groups() {
        let values = seasonal_series(60, 12, 40.0, 1.0);
        let p = anova_p_value(&values, 12);
        assert!(p < 0.01, "p = {}", p);
    }

    #[test]
    fn visual_heuristic_confirms_month_spread() {
        // Strong month pattern: some months at 40, some at 160.
        let values: Vec<f64> = (0..36)
            .map(|i| match i % 12 {
                0 | 1 | 2 => 40.0,
                9 | 10 | 11 => 160.0,
                _ => 100.0,
            })
            .collect();
        assert!(visual_heuristic(&values));
    }

    #[test]
    fn visual_heuristic_rejects_flat_months() {
        let values = vec![100.0; 36];
        assert!(!visual_heuristic(&values));
        assert!(!visual_heuristic(&values[..10]));
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        for n in [8, 16, 24, 48] {
            let values = seasonal_series(n, 4, 20.0, 5.0);
            let report = SeasonalityDetector::new().detect(&values);
            assert!((0.0..=1.0).contains(&report.confidence));
        }
    }

    #[test]
    fn harmonic_prefers_fundamental_period() {
        // A pure period-7 signal also scores highly at period 14; the
        // fundamental (7) must win when both are tested.
        let values = seasonal_series(56, 7, 25.0, 0.5);
        let report = SeasonalityDetector::new().detect(&values);
        assert_eq!(report.seasonal_period, Some(7), "reason: {}", report.reason);
    }
}
