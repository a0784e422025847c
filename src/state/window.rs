use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Time window a comparison covers, counted back from the newest data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::LastDay
    }
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::LastHour,
        TimeWindow::LastDay,
        TimeWindow::LastWeek,
        TimeWindow::LastMonth,
    ];

    /// Selector as sent to the data endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::LastHour => "1h",
            TimeWindow::LastDay => "24h",
            TimeWindow::LastWeek => "7d",
            TimeWindow::LastMonth => "30d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::LastHour => "Last hour",
            TimeWindow::LastDay => "Last 24 hours",
            TimeWindow::LastWeek => "Last 7 days",
            TimeWindow::LastMonth => "Last 30 days",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::LastHour => Duration::hours(1),
            TimeWindow::LastDay => Duration::hours(24),
            TimeWindow::LastWeek => Duration::days(7),
            TimeWindow::LastMonth => Duration::days(30),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TimeWindow::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown time window '{s}' (expected 1h, 24h, 7d or 30d)"))
    }
}
