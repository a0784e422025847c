use serde::{Deserialize, Serialize};

/// One time-bucketed reading for a sensor.
///
/// Every metric is optional: a bucket with no reading carries `None`, which
/// is distinct from a real `0.0` reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// ISO-8601 instant. Used verbatim as the merge/sort key.
    pub timestamp: String,
    #[serde(default)]
    pub avg_t: Option<f64>,
    #[serde(default)]
    pub avg_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_t: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_t: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub med_t: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub med_h: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, value: f64) -> Self {
        self.avg_t = Some(value);
        self
    }

    pub fn with_humidity(mut self, value: f64) -> Self {
        self.avg_h = Some(value);
        self
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::AvgT => self.avg_t,
            Metric::AvgH => self.avg_h,
            Metric::MinT => self.min_t,
            Metric::MaxT => self.max_t,
            Metric::MinH => self.min_h,
            Metric::MaxH => self.max_h,
            Metric::MedT => self.med_t,
            Metric::MedH => self.med_h,
        }
    }
}

/// Selects one metric column of a [`Sample`] by its wire key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "avgT")]
    AvgT,
    #[serde(rename = "avgH")]
    AvgH,
    #[serde(rename = "minT")]
    MinT,
    #[serde(rename = "maxT")]
    MaxT,
    #[serde(rename = "minH")]
    MinH,
    #[serde(rename = "maxH")]
    MaxH,
    #[serde(rename = "medT")]
    MedT,
    #[serde(rename = "medH")]
    MedH,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::AvgT
    }
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::AvgT,
        Metric::AvgH,
        Metric::MinT,
        Metric::MaxT,
        Metric::MinH,
        Metric::MaxH,
        Metric::MedT,
        Metric::MedH,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::AvgT => "avgT",
            Metric::AvgH => "avgH",
            Metric::MinT => "minT",
            Metric::MaxT => "maxT",
            Metric::MinH => "minH",
            Metric::MaxH => "maxH",
            Metric::MedT => "medT",
            Metric::MedH => "medH",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::AvgT | Metric::MinT | Metric::MaxT | Metric::MedT => "\u{00B0}C",
            Metric::AvgH | Metric::MinH | Metric::MaxH | Metric::MedH => "%",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key().eq_ignore_ascii_case(key))
    }
}

/// Sensor metadata as served by the descriptor endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub sensor_id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl SensorDescriptor {
    /// Display label: `name — location`, or just the name.
    pub fn label(&self) -> String {
        match self.location.as_deref() {
            Some(loc) if !loc.is_empty() => format!("{} \u{2014} {}", self.name, loc),
            _ => self.name.clone(),
        }
    }
}

/// Stable sort by timestamp string, ascending. Ties keep their input order.
pub fn sort_by_timestamp(samples: &mut [Sample]) {
    samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}
