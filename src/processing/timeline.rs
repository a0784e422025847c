use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::data::sample::{Metric, Sample};

/// Sorted union of the distinct timestamps of two series.
///
/// Ordering is plain string comparison. For uniformly formatted ISO-8601
/// instants that is chronological, and it keeps alignment an exact string
/// match instead of a tolerance search over parsed instants.
pub fn merge_timestamps(a: &[Sample], b: &[Sample]) -> Vec<String> {
    let set: BTreeSet<&str> = a
        .iter()
        .chain(b.iter())
        .map(|s| s.timestamp.as_str())
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// Look up `metric` in `series` for each timestamp of `timeline`.
/// No exact match, or an absent metric, yields `None`; nothing is interpolated.
/// When a series repeats a timestamp, the first sample wins.
pub fn align(timeline: &[String], series: &[Sample], metric: Metric) -> Vec<Option<f64>> {
    let mut index: HashMap<&str, &Sample> = HashMap::with_capacity(series.len());
    for s in series {
        index.entry(s.timestamp.as_str()).or_insert(s);
    }
    timeline
        .iter()
        .map(|ts| index.get(ts.as_str()).and_then(|s| s.get(metric)))
        .collect()
}

/// One aligned line of the comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    pub sensor_id: String,
    pub metric: Metric,
    pub values: Vec<Option<f64>>,
}

/// Shared timeline with every requested (sensor, metric) line aligned on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedTimeline {
    pub timestamps: Vec<String>,
    pub series: Vec<AlignedSeries>,
}

impl AlignedTimeline {
    /// Merge `(id_a, a)` and `(id_b, b)` and align each of `metrics` for both.
    /// Lines are ordered sensor A first, then sensor B, metrics in the given order.
    pub fn build(
        (id_a, a): (&str, &[Sample]),
        (id_b, b): (&str, &[Sample]),
        metrics: &[Metric],
    ) -> Self {
        let timestamps = merge_timestamps(a, b);
        let mut series = Vec::with_capacity(metrics.len() * 2);
        for (id, samples) in [(id_a, a), (id_b, b)] {
            for &metric in metrics {
                series.push(AlignedSeries {
                    sensor_id: id.to_string(),
                    metric,
                    values: align(&timestamps, samples, metric),
                });
            }
        }
        Self { timestamps, series }
    }

    pub fn line(&self, sensor_id: &str, metric: Metric) -> Option<&AlignedSeries> {
        self.series
            .iter()
            .find(|s| s.sensor_id == sensor_id && s.metric == metric)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
