//! Two-sensor comparison analytics for temperature/humidity deployments.
//!
//! Given two sensor ids and a time window, a run fetches both series from a
//! [`SampleSource`], aligns them on a shared timeline, computes per-metric
//! statistics and extrapolates a short linear forecast for each sensor.

pub mod compare;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod processing;
pub mod state;

pub use compare::{compare, ComparisonBundle, ComparisonReport};
pub use config::AnalyticsConfig;
pub use data::sample::{Metric, Sample, SensorDescriptor};
pub use data::source::SampleSource;
pub use error::{CompareError, LoadError, RetrievalError};
pub use processing::forecast::{ForecastConfig, ForecastPoint, LinearForecaster};
pub use processing::statistics::SeriesStatistics;
pub use state::session::ComparisonSession;
pub use state::window::TimeWindow;
