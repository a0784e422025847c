//! Two-sensor comparison: retrieval, alignment, statistics and forecasts.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::AnalyticsConfig;
use crate::data::datetime::format_short_date;
use crate::data::sample::{sort_by_timestamp, Metric, Sample, SensorDescriptor};
use crate::data::source::SampleSource;
use crate::error::CompareError;
use crate::processing::forecast::{ForecastPoint, LinearForecaster};
use crate::processing::statistics::{fmt_opt, SeriesStatistics};
use crate::processing::timeline::AlignedTimeline;
use crate::state::window::TimeWindow;

/// Metrics drawn on the comparison chart, per sensor.
pub const CHART_METRICS: [Metric; 2] = [Metric::AvgT, Metric::AvgH];

/// Raw series and statistics of one comparison, keyed by sensor id.
///
/// Export and chart code index into `series` and `stats` by id, so the
/// field names and nesting are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonBundle {
    pub ids: [String; 2],
    pub series: HashMap<String, Vec<Sample>>,
    pub stats: HashMap<String, SeriesStatistics>,
}

impl ComparisonBundle {
    pub fn series_of(&self, id: &str) -> &[Sample] {
        self.series.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats_of(&self, id: &str) -> Option<&SeriesStatistics> {
        self.stats.get(id)
    }
}

/// Everything a comparison run produces.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub bundle: ComparisonBundle,
    pub window: TimeWindow,
    /// Display labels for sensor A and B; the id when no descriptor matched.
    pub names: [String; 2],
    pub timeline: AlignedTimeline,
    pub forecast_metric: Metric,
    /// `None` for a sensor with no usable points.
    pub forecasts: HashMap<String, Option<Vec<ForecastPoint>>>,
}

impl ComparisonReport {
    pub fn ids(&self) -> [&str; 2] {
        [&self.bundle.ids[0], &self.bundle.ids[1]]
    }

    /// Mean temperature of A minus mean temperature of B.
    pub fn temperature_delta(&self) -> Option<f64> {
        let [a, b] = self.ids();
        let ta = self.bundle.stats_of(a)?.avg_t?;
        let tb = self.bundle.stats_of(b)?.avg_t?;
        Some(ta - tb)
    }

    pub fn forecast_of(&self, id: &str) -> Option<&[ForecastPoint]> {
        self.forecasts.get(id)?.as_deref()
    }

    /// Last `n` samples of each series, sensor A first.
    pub fn recent_rows(&self, n: usize) -> Vec<(&str, &Sample)> {
        self.ids()
            .into_iter()
            .flat_map(|id| {
                let series = self.bundle.series_of(id);
                let start = series.len().saturating_sub(n);
                series[start..].iter().map(move |s| (id, s))
            })
            .collect()
    }

    /// Plain-text summary.
    pub fn render(&self, recent: usize) -> String {
        let mut out = String::new();
        let [a, b] = self.ids();
        let _ = writeln!(out, "Comparison ({})", self.window.label());
        let _ = writeln!(out, "  A: {} [{}]", self.names[0], a);
        let _ = writeln!(out, "  B: {} [{}]", self.names[1], b);
        let _ = writeln!(out, "  Timeline: {} points", self.timeline.len());
        out.push('\n');

        for (label, id) in [("Sensor A", a), ("Sensor B", b)] {
            if let Some(stats) = self.bundle.stats_of(id) {
                out.push_str(&stats.report(label));
            }
        }
        let delta = self.temperature_delta().map(|d| format!("{d:.2} \u{00B0}C"));
        let _ = writeln!(
            out,
            "\nDifference (mean temp A - B): {}",
            delta.as_deref().unwrap_or("\u{2014}")
        );

        let _ = writeln!(out, "\nForecast ({}):", self.forecast_metric.key());
        for (label, id) in [("A", a), ("B", b)] {
            let line = match self.forecast_of(id) {
                Some(points) if !points.is_empty() => points
                    .iter()
                    .map(|p| {
                        format!(
                            "{} {:.2}{}",
                            format_short_date(&p.timestamp),
                            p.value,
                            self.forecast_metric.unit()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" | "),
                _ => "\u{2014}".to_string(),
            };
            let _ = writeln!(out, "  {label}: {line}");
        }

        if recent > 0 {
            let _ = writeln!(out, "\nRecent samples:");
            let _ = writeln!(out, "  {:<6} {:<17} {:>8} {:>8}", "Sensor", "Timestamp", "AvgT", "AvgH");
            for (id, s) in self.recent_rows(recent) {
                let tag = if id == a { "A" } else { "B" };
                let _ = writeln!(
                    out,
                    "  {:<6} {:<17} {:>8} {:>8}",
                    tag,
                    format_short_date(&s.timestamp),
                    fmt_opt(s.avg_t, 2),
                    fmt_opt(s.avg_h, 1)
                );
            }
        }
        out
    }
}

fn display_name(sensors: &[SensorDescriptor], id: &str) -> String {
    sensors
        .iter()
        .find(|s| s.sensor_id == id)
        .map(SensorDescriptor::label)
        .unwrap_or_else(|| id.to_string())
}

/// Reject requests that can never produce a comparison.
pub fn check_pair(sensor_a: &str, sensor_b: &str) -> Result<(), CompareError> {
    if sensor_a == sensor_b {
        return Err(CompareError::SameSensor(sensor_a.to_string()));
    }
    Ok(())
}

/// Compare `sensor_a` with `sensor_b` over `config.window`.
///
/// Retrieval happens in two sequential calls (descriptors, then samples).
/// Any retrieval failure aborts the run with no partial result.
pub fn compare<S: SampleSource + ?Sized>(
    source: &S,
    sensor_a: &str,
    sensor_b: &str,
    config: &AnalyticsConfig,
) -> Result<ComparisonReport, CompareError> {
    check_pair(sensor_a, sensor_b)?;
    let window = config.window;

    let sensors = source.sensors().inspect_err(|e| {
        tracing::error!("Sensor listing failed: {e}");
    })?;
    let mut data = source
        .samples(&[sensor_a, sensor_b], window)
        .inspect_err(|e| tracing::error!("Sample retrieval failed: {e}"))?;

    let mut series_a = data.remove(sensor_a).unwrap_or_default();
    let mut series_b = data.remove(sensor_b).unwrap_or_default();
    sort_by_timestamp(&mut series_a);
    sort_by_timestamp(&mut series_b);

    let timeline = AlignedTimeline::build(
        (sensor_a, &series_a),
        (sensor_b, &series_b),
        &CHART_METRICS,
    );

    let forecaster = LinearForecaster::new(config.forecast);
    let metric = config.forecast_metric;
    let mut forecasts = HashMap::with_capacity(2);
    let mut stats = HashMap::with_capacity(2);
    for (id, series) in [(sensor_a, &series_a), (sensor_b, &series_b)] {
        stats.insert(id.to_string(), SeriesStatistics::compute(series));
        forecasts.insert(id.to_string(), forecaster.forecast(series, metric));
    }

    tracing::info!(
        sensor_a,
        sensor_b,
        window = %window,
        samples_a = series_a.len(),
        samples_b = series_b.len(),
        timeline = timeline.len(),
        "comparison complete"
    );

    let names = [
        display_name(&sensors, sensor_a),
        display_name(&sensors, sensor_b),
    ];
    let mut series = HashMap::with_capacity(2);
    series.insert(sensor_a.to_string(), series_a);
    series.insert(sensor_b.to_string(), series_b);

    Ok(ComparisonReport {
        bundle: ComparisonBundle {
            ids: [sensor_a.to_string(), sensor_b.to_string()],
            series,
            stats,
        },
        window,
        names,
        timeline,
        forecast_metric: metric,
        forecasts,
    })
}
