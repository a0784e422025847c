use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::datetime::parse_instant;
use crate::data::sample::{Sample, SensorDescriptor};
use crate::data::source::{SampleSource, SeriesMap};
use crate::error::{LoadError, RetrievalError};
use crate::state::window::TimeWindow;

/// On-disk snapshot of both backend endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorDump {
    #[serde(default)]
    pub sensors: Vec<SensorDescriptor>,
    #[serde(default)]
    pub samples: SeriesMap,
}

/// One row of the flat CSV layout (`sensor_id,timestamp,avgT,avgH,...`).
#[derive(Debug, Deserialize)]
struct CsvRow {
    sensor_id: String,
    timestamp: String,
    #[serde(rename = "avgT", default)]
    avg_t: Option<f64>,
    #[serde(rename = "avgH", default)]
    avg_h: Option<f64>,
    #[serde(rename = "minT", default)]
    min_t: Option<f64>,
    #[serde(rename = "maxT", default)]
    max_t: Option<f64>,
    #[serde(rename = "minH", default)]
    min_h: Option<f64>,
    #[serde(rename = "maxH", default)]
    max_h: Option<f64>,
    #[serde(rename = "medT", default)]
    med_t: Option<f64>,
    #[serde(rename = "medH", default)]
    med_h: Option<f64>,
}

impl CsvRow {
    fn into_sample(self) -> (String, Sample) {
        let sample = Sample {
            timestamp: self.timestamp.trim().to_string(),
            avg_t: self.avg_t,
            avg_h: self.avg_h,
            min_t: self.min_t,
            max_t: self.max_t,
            min_h: self.min_h,
            max_h: self.max_h,
            med_t: self.med_t,
            med_h: self.med_h,
        };
        (self.sensor_id.trim().to_string(), sample)
    }
}

/// Offline [`SampleSource`] backed by a JSON or CSV dump.
///
/// Windows are anchored at the newest parseable timestamp in the dump unless
/// an explicit anchor is set, so old snapshots still return data.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    dump: SensorDump,
    anchor: Option<DateTime<Utc>>,
}

impl FileSource {
    pub fn new(dump: SensorDump) -> Self {
        Self { dump, anchor: None }
    }

    /// Count windows back from `now` instead of from the newest sample.
    pub fn anchored_at(mut self, now: DateTime<Utc>) -> Self {
        self.anchor = Some(now);
        self
    }

    pub fn dump(&self) -> &SensorDump {
        &self.dump
    }

    fn newest(&self) -> Option<DateTime<Utc>> {
        self.dump
            .samples
            .values()
            .flatten()
            .filter_map(|s| parse_instant(&s.timestamp))
            .max()
    }
}

impl SampleSource for FileSource {
    fn sensors(&self) -> Result<Vec<SensorDescriptor>, RetrievalError> {
        Ok(self.dump.sensors.clone())
    }

    fn samples(&self, ids: &[&str], window: TimeWindow) -> Result<SeriesMap, RetrievalError> {
        let cutoff = self.anchor.or_else(|| self.newest()).map(|t| t - window.duration());

        let mut out = SeriesMap::with_capacity(ids.len());
        for &id in ids {
            let Some(series) = self.dump.samples.get(id) else {
                tracing::debug!(sensor = id, "no samples in dump");
                continue;
            };
            let kept: Vec<Sample> = series
                .iter()
                .filter(|s| match (cutoff, parse_instant(&s.timestamp)) {
                    (Some(cutoff), Some(ts)) => ts >= cutoff,
                    // Timestamps are not validated here; unparseable ones pass through.
                    _ => true,
                })
                .cloned()
                .collect();
            out.insert(id.to_string(), kept);
        }
        Ok(out)
    }
}

/// Load a JSON or CSV dump, chosen by file extension.
pub fn load_file(path: &Path) -> Result<FileSource, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let dump = match ext.as_str() {
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        _ => return Err(LoadError::UnsupportedFormat(ext)),
    };
    tracing::info!(
        "Loaded {} sensors / {} series from {:?}",
        dump.sensors.len(),
        dump.samples.len(),
        path
    );
    Ok(FileSource::new(dump))
}

fn load_json(path: &Path) -> Result<SensorDump, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_csv(path: &Path) -> Result<SensorDump, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut dump = SensorDump::default();
    let mut ids = BTreeSet::new();
    for result in reader.deserialize::<CsvRow>() {
        let row = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let (id, sample) = row.into_sample();
        ids.insert(id.clone());
        dump.samples.entry(id).or_default().push(sample);
    }

    // A flat CSV carries no metadata; the id doubles as the name.
    dump.sensors = ids
        .into_iter()
        .map(|id| SensorDescriptor {
            name: id.clone(),
            sensor_id: id,
            location: None,
        })
        .collect();
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    const DUMP: &str = r#"{
        "sensors": [
            {"sensor_id": "s1", "name": "Bodega", "location": "Norte"},
            {"sensor_id": "s2", "name": "Oficina"}
        ],
        "samples": {
            "s1": [
                {"timestamp": "2024-04-20T10:00:00Z", "avgT": 19.0, "avgH": 50.0},
                {"timestamp": "2024-05-01T09:30:00Z", "avgT": 20.0, "avgH": 51.0},
                {"timestamp": "2024-05-01T10:00:00Z", "avgT": 21.0, "avgH": null}
            ],
            "s2": [
                {"timestamp": "2024-05-01T10:00:00Z", "avgT": 18.0}
            ]
        }
    }"#;

    #[test]
    fn test_load_json_dump() {
        let f = write_temp(".json", DUMP);
        let source = load_file(f.path()).unwrap();
        let sensors = source.sensors().unwrap();
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[1].location, None);
        assert_eq!(source.dump().samples["s1"][2].avg_h, None);
    }

    #[test]
    fn test_window_anchored_at_newest_sample() {
        let f = write_temp(".json", DUMP);
        let source = load_file(f.path()).unwrap();

        let day = source.samples(&["s1", "s2"], TimeWindow::LastDay).unwrap();
        assert_eq!(day["s1"].len(), 2);
        assert_eq!(day["s2"].len(), 1);

        let hour = source.samples(&["s1"], TimeWindow::LastHour).unwrap();
        assert_eq!(hour["s1"].len(), 2);

        let month = source.samples(&["s1"], TimeWindow::LastMonth).unwrap();
        assert_eq!(month["s1"].len(), 3);
    }

    #[test]
    fn test_explicit_anchor_and_unknown_ids() {
        let f = write_temp(".json", DUMP);
        let now = parse_instant("2024-05-01T10:20:00Z").unwrap();
        let source = load_file(f.path()).unwrap().anchored_at(now);
        let out = source.samples(&["s1", "nope"], TimeWindow::LastHour).unwrap();
        assert_eq!(out["s1"].len(), 2);
        assert!(!out.contains_key("nope"));
    }

    #[test]
    fn test_load_csv_rows() {
        let csv = "sensor_id,timestamp,avgT,avgH,minT,maxT,medT,medH\n\
                   b,2024-05-01T10:00:00Z,20.5,,19,22,,\n\
                   a,2024-05-01T10:00:00Z,0,40,,,,\n\
                   b,2024-05-01T10:05:00Z,,41,,,,\n";
        let f = write_temp(".csv", csv);
        let source = load_file(f.path()).unwrap();
        let dump = source.dump();

        let ids: Vec<_> = dump.sensors.iter().map(|s| s.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(dump.samples["a"][0].avg_t, Some(0.0));
        assert_eq!(dump.samples["b"][0].avg_h, None);
        assert_eq!(dump.samples["b"][0].min_t, Some(19.0));
        assert_eq!(dump.samples["b"][1].avg_t, None);
    }

    #[test]
    fn test_unsupported_and_malformed() {
        let f = write_temp(".xlsx", "");
        assert!(matches!(load_file(f.path()), Err(LoadError::UnsupportedFormat(e)) if e == "xlsx"));

        let f = write_temp(".json", "{ not json");
        assert!(matches!(load_file(f.path()), Err(LoadError::Json { .. })));

        let missing = Path::new("/nonexistent/dump.json");
        assert!(matches!(load_file(missing), Err(LoadError::Io { .. })));
    }
}
