use serde::{Deserialize, Serialize};

use crate::data::sample::{Metric, Sample};

/// Descriptive statistics for one metric.
/// `None` fields mean "no data"; they are never zero-filled or NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Population standard deviation (divides by `count`).
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MetricSummary {
    /// Summarize a stream of optional values. Absent and non-finite values are skipped.
    pub fn compute<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let vals: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();

        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        for &v in &vals {
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }

        let count = vals.len();
        let mean = (count > 0).then(|| vals.iter().sum::<f64>() / count as f64);
        let variance =
            mean.map(|m| vals.iter().map(|v| (v - m).powi(2)).sum::<f64>() / count as f64);

        Self {
            count,
            mean,
            std_dev: variance.map(f64::sqrt),
            min,
            max,
        }
    }

    pub fn of(samples: &[Sample], metric: Metric) -> Self {
        Self::compute(samples.iter().map(|s| s.get(metric)))
    }
}

/// Temperature and humidity statistics for one series.
/// Field names are the wire contract read by the export side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStatistics {
    pub avg_t: Option<f64>,
    pub avg_h: Option<f64>,
    pub std_t: Option<f64>,
    pub std_h: Option<f64>,
    pub min_t: Option<f64>,
    pub max_t: Option<f64>,
    pub min_h: Option<f64>,
    pub max_h: Option<f64>,
    pub count_t: usize,
    pub count_h: usize,
}

impl SeriesStatistics {
    /// Aggregate bucket averages (`avgT`, `avgH`) of a series.
    pub fn compute(samples: &[Sample]) -> Self {
        let t = MetricSummary::of(samples, Metric::AvgT);
        let h = MetricSummary::of(samples, Metric::AvgH);
        Self {
            avg_t: t.mean,
            avg_h: h.mean,
            std_t: t.std_dev,
            std_h: h.std_dev,
            min_t: t.min,
            max_t: t.max,
            min_h: h.min,
            max_h: h.max,
            count_t: t.count,
            count_h: h.count,
        }
    }

    /// Format as a multi-line report string.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}:\n  Temp  n={}  mean={}  std={}  min={}  max={}\n  Hum   n={}  mean={}  std={}  min={}  max={}\n",
            label,
            self.count_t,
            fmt_opt(self.avg_t, 2),
            fmt_opt(self.std_t, 2),
            fmt_opt(self.min_t, 2),
            fmt_opt(self.max_t, 2),
            self.count_h,
            fmt_opt(self.avg_h, 1),
            fmt_opt(self.std_h, 2),
            fmt_opt(self.min_h, 1),
            fmt_opt(self.max_h, 1),
        )
    }
}

/// Fixed-precision number, or an em dash for "no data".
pub fn fmt_opt(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) => format!("{v:.digits$}"),
        None => "\u{2014}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temps(values: &[Option<f64>]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample {
                timestamp: format!("2024-05-01T10:{:02}:00Z", i),
                avg_t: *v,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_known_values() {
        let s = SeriesStatistics::compute(&temps(&[Some(10.0), Some(20.0), Some(30.0)]));
        assert_eq!(s.avg_t, Some(20.0));
        assert!((s.std_t.unwrap() - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((s.std_t.unwrap() - 8.165).abs() < 1e-3);
        assert_eq!(s.min_t, Some(10.0));
        assert_eq!(s.max_t, Some(30.0));
        assert_eq!(s.count_t, 3);
    }

    #[test]
    fn test_all_absent_is_null_not_nan() {
        let s = SeriesStatistics::compute(&temps(&[None, None]));
        assert_eq!(s.count_t, 0);
        assert_eq!(s.avg_t, None);
        assert_eq!(s.std_t, None);
        assert_eq!(s.min_t, None);
        assert_eq!(s.max_t, None);
        assert_eq!(s.count_h, 0);
        assert_eq!(s.avg_h, None);

        let empty = SeriesStatistics::compute(&[]);
        assert_eq!(empty, SeriesStatistics::default());
    }

    #[test]
    fn test_absent_skipped_zero_kept() {
        let s = SeriesStatistics::compute(&temps(&[Some(0.0), None, Some(4.0)]));
        assert_eq!(s.count_t, 2);
        assert_eq!(s.avg_t, Some(2.0));
        assert_eq!(s.min_t, Some(0.0));
        assert_eq!(s.std_t, Some(2.0));
    }

    #[test]
    fn test_non_finite_skipped() {
        let m = MetricSummary::compute([Some(1.0), Some(f64::NAN), Some(f64::INFINITY), Some(3.0)]);
        assert_eq!(m.count, 2);
        assert_eq!(m.mean, Some(2.0));
        assert_eq!(m.max, Some(3.0));
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let m = MetricSummary::compute([Some(7.5)]);
        assert_eq!(m.std_dev, Some(0.0));
        assert_eq!(m.min, m.max);
    }

    #[test]
    fn test_wire_field_names() {
        let s = SeriesStatistics::compute(&temps(&[Some(1.0)]));
        let v = serde_json::to_value(&s).unwrap();
        for key in [
            "avgT", "avgH", "stdT", "stdH", "minT", "maxT", "minH", "maxH", "countT", "countH",
        ] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert!(v["avgH"].is_null());
        assert_eq!(v["countT"], 1);
    }

    #[test]
    fn test_report_marks_missing() {
        let s = SeriesStatistics::compute(&temps(&[Some(21.0)]));
        let r = s.report("A");
        assert!(r.contains("mean=21.00"));
        assert!(r.contains("\u{2014}"));
    }
}
