use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::sample::Metric;
use crate::error::LoadError;
use crate::processing::forecast::ForecastConfig;
use crate::state::window::TimeWindow;

/// Tunables for a comparison run. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub window: TimeWindow,
    /// Metric extrapolated for each sensor.
    pub forecast_metric: Metric,
    pub forecast: ForecastConfig,
    /// Rows per sensor in the "recent samples" table.
    pub recent_rows: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window: TimeWindow::default(),
            forecast_metric: Metric::AvgT,
            forecast: ForecastConfig::default(),
            recent_rows: 10,
        }
    }
}

impl AnalyticsConfig {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|reason| LoadError::InvalidConfig {
            path: path.to_path_buf(),
            reason,
        })?;
        tracing::info!("Config loaded from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.forecast.validate()
    }
}
