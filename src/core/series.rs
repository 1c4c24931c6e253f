//! DemandSeries: an ordered sequence of per-period demand observations.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Granularity of one observation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// Short label used in reports and audit records.
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

/// A named, ordered demand series. Insertion order is chronological order.
///
/// The series is the only input the engine receives per store/SKU; everything
/// downstream (statistics, outlier reports, forecasts) is derived from it.
/// Values may carry NaN as a missing-value sentinel until validation, which
/// rejects it; missing periods are never silently coerced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandSeries {
    id: String,
    values: Vec<f64>,
    granularity: Granularity,
    start: Option<NaiveDate>,
}

impl DemandSeries {
    /// Create a new series. Rejects empty input.
    pub fn new(id: impl Into<String>, values: Vec<f64>, granularity: Granularity) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok(Self {
            id: id.into(),
            values,
            granularity,
            start: None,
        })
    }

    /// Convenience constructor for monthly series, the most common layout.
    pub fn monthly(id: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        Self::new(id, values, Granularity::Monthly)
    }

    /// Attach the calendar date of the first period.
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    /// Extract a prefix of the series, used by walk-forward validation.
    pub fn prefix(&self, len: usize) -> Result<DemandSeries> {
        if len == 0 || len > self.values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "prefix length {} out of range 1..={}",
                len,
                self.values.len()
            )));
        }
        Ok(DemandSeries {
            id: self.id.clone(),
            values: self.values[..len].to_vec(),
            granularity: self.granularity,
            start: self.start,
        })
    }

    /// Aggregate a daily series into weekly (ISO week) or monthly buckets.
    ///
    /// Bucket values are sums. Requires a start date so periods can be mapped
    /// to calendar dates.
    pub fn aggregate(&self, target: Granularity) -> Result<DemandSeries> {
        if self.granularity != Granularity::Daily {
            return Err(ForecastError::InvalidParameter(
                "aggregation is only defined for daily series".to_string(),
            ));
        }
        let start = self.start.ok_or_else(|| {
            ForecastError::InvalidParameter(
                "aggregation requires a start date on the series".to_string(),
            )
        })?;

        let bucket_key = |date: NaiveDate| -> (i32, u32) {
            match target {
                Granularity::Weekly => {
                    let iso = date.iso_week();
                    (iso.year(), iso.week())
                }
                Granularity::Monthly => (date.year(), date.month()),
                Granularity::Daily => (date.year(), date.ordinal()),
            }
        };

        let mut buckets: Vec<((i32, u32), f64, NaiveDate)> = Vec::new();
        for (i, &v) in self.values.iter().enumerate() {
            let date = start + Duration::days(i as i64);
            let key = bucket_key(date);
            match buckets.last_mut() {
                Some((last_key, sum, _)) if *last_key == key => *sum += v,
                _ => buckets.push((key, v, date)),
            }
        }

        let first_bucket_start = buckets.first().map(|(_, _, d)| *d);
        let values: Vec<f64> = buckets.into_iter().map(|(_, sum, _)| sum).collect();

        let mut out = DemandSeries::new(self.id.clone(), values, target)?;
        out.start = first_bucket_start;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn series_constructs_and_exposes_values() {
        let s = DemandSeries::monthly("sku-1", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.id(), "sku-1");
        assert_eq!(s.len(), 3);
        assert_eq!(s.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(s.granularity(), Granularity::Monthly);
        assert!(s.start().is_none());
    }

    #[test]
    fn series_rejects_empty_input() {
        let result = DemandSeries::monthly("sku-1", vec![]);
        assert!(matches!(result, Err(ForecastError::EmptyData)));
    }

    #[test]
    fn prefix_preserves_identity() {
        let s = DemandSeries::monthly("sku-1", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let p = s.prefix(2).unwrap();
        assert_eq!(p.id(), "sku-1");
        assert_eq!(p.values(), &[1.0, 2.0]);

        assert!(s.prefix(0).is_err());
        assert!(s.prefix(5).is_err());
    }

    #[test]
    fn aggregate_daily_to_monthly_sums_buckets() {
        // 31 days of January plus 3 days of February, value 1.0 each.
        let values = vec![1.0; 34];
        let s = DemandSeries::new("sku-1", values, Granularity::Daily)
            .unwrap()
            .with_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let monthly = s.aggregate(Granularity::Monthly).unwrap();
        assert_eq!(monthly.len(), 2);
        assert_relative_eq!(monthly.values()[0], 31.0, epsilon = 1e-12);
        assert_relative_eq!(monthly.values()[1], 3.0, epsilon = 1e-12);
        assert_eq!(monthly.granularity(), Granularity::Monthly);
    }

    #[test]
    fn aggregate_daily_to_weekly_uses_iso_weeks() {
        // 2024-01-01 is a Monday; 14 days = exactly two ISO weeks.
        let values: Vec<f64> = (1..=14).map(|i| i as f64).collect();
        let s = DemandSeries::new("sku-1", values, Granularity::Daily)
            .unwrap()
            .with_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let weekly = s.aggregate(Granularity::Weekly).unwrap();
        assert_eq!(weekly.len(), 2);
        assert_relative_eq!(weekly.values()[0], 28.0, epsilon = 1e-12); // 1..=7
        assert_relative_eq!(weekly.values()[1], 77.0, epsilon = 1e-12); // 8..=14
    }

    #[test]
    fn aggregate_requires_daily_series_with_start() {
        let monthly = DemandSeries::monthly("sku-1", vec![1.0, 2.0]).unwrap();
        assert!(monthly.aggregate(Granularity::Weekly).is_err());

        let daily_no_start =
            DemandSeries::new("sku-1", vec![1.0, 2.0], Granularity::Daily).unwrap();
        assert!(daily_no_start.aggregate(Granularity::Weekly).is_err());
    }
}
