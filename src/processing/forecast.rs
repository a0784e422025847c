//! Short-horizon linear forecasting.
//!
//! Fits `y = a + b·x` by ordinary least squares, where `x` is minutes since
//! the Unix epoch, and extrapolates a fixed number of evenly spaced steps
//! past the last observation. Degenerate inputs fall back to a flat
//! projection of the last observed value instead of failing.

use serde::{Deserialize, Serialize};

use crate::data::datetime::{format_epoch_minutes, to_epoch_minutes};
use crate::data::sample::{Metric, Sample};

pub const DEFAULT_STEPS: usize = 4;
pub const DEFAULT_STEP_MINUTES: f64 = 5.0;
pub const DEFAULT_DEGENERATE_THRESHOLD: f64 = 1e-9;

/// One extrapolated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    pub value: f64,
    /// Position on the regression axis (epoch minutes).
    #[serde(skip)]
    pub minutes: f64,
}

/// Fitted line `y = intercept + slope·(x − origin)`.
///
/// `origin` is the first observed x. Keeping it out of the sums leaves the
/// regression terms at the scale of the sampled span, not of the epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    /// Fitted value at `origin`.
    pub intercept: f64,
    pub origin: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * (x - self.origin)
    }

    /// Intercept of the line on the absolute x axis.
    pub fn intercept_at_zero(&self) -> f64 {
        self.intercept - self.slope * self.origin
    }
}

/// Forecast horizon and numerical guard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future points to produce.
    pub steps: usize,
    /// Spacing between future points, in minutes.
    pub step_minutes: f64,
    /// `|n·Σx² − (Σx)²|` (x relative to the first point) below this is
    /// treated as a singular fit.
    pub degenerate_threshold: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            step_minutes: DEFAULT_STEP_MINUTES,
            degenerate_threshold: DEFAULT_DEGENERATE_THRESHOLD,
        }
    }
}

impl ForecastConfig {
    /// Reject horizons that would not land strictly after the last sample.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.step_minutes.is_finite() && self.step_minutes > 0.0) {
            return Err(format!(
                "step_minutes must be a positive number, got {}",
                self.step_minutes
            ));
        }
        if !(self.degenerate_threshold.is_finite() && self.degenerate_threshold >= 0.0) {
            return Err(format!(
                "degenerate_threshold must be a non-negative number, got {}",
                self.degenerate_threshold
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearForecaster {
    config: ForecastConfig,
}

impl LinearForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Regression inputs for `metric`: `(epoch minutes, value)` in series order.
    /// Samples with an unparseable timestamp or a missing/non-finite value are dropped.
    pub fn points(samples: &[Sample], metric: Metric) -> Vec<(f64, f64)> {
        samples
            .iter()
            .filter_map(|s| {
                let x = to_epoch_minutes(&s.timestamp)?;
                let y = s.get(metric)?;
                (x.is_finite() && y.is_finite()).then_some((x, y))
            })
            .collect()
    }

    /// OLS fit via the closed form over Σx, Σy, Σxy, Σx², with x measured
    /// from the first point. `None` with fewer than two points or a
    /// near-singular denominator.
    pub fn fit(&self, points: &[(f64, f64)]) -> Option<LinearFit> {
        if points.len() < 2 {
            return None;
        }
        let origin = points[0].0;
        let n = points.len() as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
        for &(x, y) in points {
            let x = x - origin;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }

        let denom = n * sum_xx - sum_x * sum_x;
        if !denom.is_finite() || denom.abs() < self.config.degenerate_threshold {
            return None;
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denom;
        let intercept = (sum_y - slope * sum_x) / n;
        (slope.is_finite() && intercept.is_finite()).then_some(LinearFit {
            slope,
            intercept,
            origin,
        })
    }

    /// Forecast `metric` of a series. `None` when no point is usable.
    pub fn forecast(&self, samples: &[Sample], metric: Metric) -> Option<Vec<ForecastPoint>> {
        self.forecast_points(&Self::points(samples, metric))
    }

    /// Forecast from prepared `(minutes, value)` points.
    ///
    /// One point, or a singular fit, projects the last value flat.
    pub fn forecast_points(&self, points: &[(f64, f64)]) -> Option<Vec<ForecastPoint>> {
        let &(last_x, last_y) = points.last()?;
        let fit = self.fit(points);
        if fit.is_none() && points.len() > 1 {
            tracing::debug!(points = points.len(), "singular regression, projecting last value");
        }

        let out = (1..=self.config.steps)
            .filter_map(|k| {
                let x = last_x + self.config.step_minutes * k as f64;
                Some(ForecastPoint {
                    timestamp: format_epoch_minutes(x)?,
                    value: fit.map_or(last_y, |f| f.predict(x)),
                    minutes: x,
                })
            })
            .collect();
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: &str = "2024-05-01T10:00:00Z";

    fn t0() -> f64 {
        to_epoch_minutes(T0).unwrap()
    }

    #[test]
    fn test_no_points_no_forecast() {
        let f = LinearForecaster::default();
        assert_eq!(f.forecast(&[], Metric::AvgT), None);

        let absent = vec![Sample::new(T0), Sample::new("bogus").with_temperature(3.0)];
        assert_eq!(f.forecast(&absent, Metric::AvgT), None);
    }

    #[test]
    fn test_single_point_flat_projection() {
        let f = LinearForecaster::default();
        let out = f
            .forecast(&[Sample::new(T0).with_temperature(5.0)], Metric::AvgT)
            .unwrap();
        assert_eq!(out.len(), 4);
        for (k, p) in out.iter().enumerate() {
            assert_eq!(p.value, 5.0);
            assert_eq!(p.minutes, t0() + 5.0 * (k + 1) as f64);
        }
        let stamps: Vec<_> = out.iter().map(|p| p.timestamp.as_str()).collect();
        assert_eq!(
            stamps,
            vec![
                "2024-05-01T10:05:00.000Z",
                "2024-05-01T10:10:00.000Z",
                "2024-05-01T10:15:00.000Z",
                "2024-05-01T10:20:00.000Z",
            ]
        );
    }

    #[test]
    fn test_recovers_exact_line() {
        let f = LinearForecaster::default();
        let pts: Vec<(f64, f64)> = [0.0, 1.0, 2.0, 5.0, 9.0]
            .iter()
            .map(|&x| (x, 2.0 * x + 1.0))
            .collect();
        let fit = f.fit(&pts).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept_at_zero() - 1.0).abs() < 1e-9);

        let out = f.forecast_points(&pts).unwrap();
        assert_eq!(out.len(), 4);
        for p in &out {
            assert!((p.value - (2.0 * p.minutes + 1.0)).abs() < 1e-9);
        }
        assert_eq!(out[0].minutes, 14.0);
        assert_eq!(out[3].minutes, 29.0);
    }

    #[test]
    fn test_linear_trend_on_real_timestamps() {
        // +0.1 °C per minute, sampled every 5 minutes.
        let samples: Vec<Sample> = (0..6)
            .map(|i| {
                Sample::new(format!("2024-05-01T10:{:02}:00Z", i * 5))
                    .with_temperature(20.0 + 0.5 * i as f64)
            })
            .collect();
        let f = LinearForecaster::default();
        let out = f.forecast(&samples, Metric::AvgT).unwrap();
        assert_eq!(out[0].timestamp, "2024-05-01T10:30:00.000Z");
        assert!((out[0].value - 23.0).abs() < 1e-9);
        assert!((out[3].value - 24.5).abs() < 1e-9);
    }

    #[test]
    fn test_exact_line_on_epoch_minutes() {
        // y = 2x + 1 with x counted from the first sample, every 30 s.
        let base = to_epoch_minutes("2024-05-01T10:00:30Z").unwrap();
        let samples: Vec<Sample> = (0..10)
            .map(|i| {
                let ts = format!("2024-05-01T10:{:02}:{:02}Z", (30 + i * 30) / 60, (30 + i * 30) % 60);
                let x = to_epoch_minutes(&ts).unwrap() - base;
                Sample::new(ts).with_temperature(2.0 * x + 1.0)
            })
            .collect();

        let f = LinearForecaster::default();
        let fit = f.fit(&LinearForecaster::points(&samples, Metric::AvgT)).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-6);
        assert!((fit.predict(base) - 1.0).abs() < 1e-6);

        let out = f.forecast(&samples, Metric::AvgT).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].timestamp, "2024-05-01T10:10:00.000Z");
        for p in &out {
            let expected = 2.0 * (p.minutes - base) + 1.0;
            assert!((p.value - expected).abs() < 1e-6, "{} vs {}", p.value, expected);
        }
        assert!((out[0].value - 20.0).abs() < 1e-6);
        assert!((out[3].value - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_shared_timestamp_with_seconds_is_flat() {
        let f = LinearForecaster::default();
        for n in [3usize, 5, 7] {
            let samples: Vec<Sample> = (0..n)
                .map(|i| Sample::new("2024-05-01T10:00:30Z").with_temperature(1.0 + 3.0 * i as f64))
                .collect();
            let last = 1.0 + 3.0 * (n - 1) as f64;

            assert_eq!(f.fit(&LinearForecaster::points(&samples, Metric::AvgT)), None);
            let out = f.forecast(&samples, Metric::AvgT).unwrap();
            assert_eq!(out.len(), 4);
            assert!(out.iter().all(|p| p.value == last), "n={n}");
            assert_eq!(out[0].timestamp, "2024-05-01T10:05:30.000Z");
        }
    }

    #[test]
    fn test_identical_x_falls_back_to_last_point() {
        let f = LinearForecaster::default();
        let pts = vec![(100.0, 1.0), (100.0, 2.0), (100.0, 7.0)];
        assert_eq!(f.fit(&pts), None);
        let out = f.forecast_points(&pts).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|p| p.value == 7.0));
        assert_eq!(out[1].minutes, 110.0);
    }

    #[test]
    fn test_configurable_horizon() {
        let f = LinearForecaster::new(ForecastConfig {
            steps: 2,
            step_minutes: 15.0,
            ..Default::default()
        });
        let out = f.forecast_points(&[(0.0, 1.0)]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].minutes, 30.0);

        let none = LinearForecaster::new(ForecastConfig {
            steps: 0,
            ..Default::default()
        });
        assert_eq!(none.forecast_points(&[(0.0, 1.0)]), Some(vec![]));
    }

    #[test]
    fn test_config_validation() {
        assert!(ForecastConfig::default().validate().is_ok());
        for step_minutes in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let c = ForecastConfig {
                step_minutes,
                ..Default::default()
            };
            assert!(c.validate().is_err(), "{step_minutes} accepted");
        }
        let c = ForecastConfig {
            degenerate_threshold: -1.0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_filtered() {
        let samples = vec![
            Sample::new(T0).with_temperature(f64::NAN),
            Sample::new("2024-05-01T10:05:00Z").with_temperature(4.0),
        ];
        let pts = LinearForecaster::points(&samples, Metric::AvgT);
        assert_eq!(pts.len(), 1);
        let out = LinearForecaster::default().forecast(&samples, Metric::AvgT).unwrap();
        assert!(out.iter().all(|p| p.value == 4.0));
    }
}
