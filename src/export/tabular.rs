use std::io::Write;
use std::path::Path;

use crate::compare::ComparisonBundle;

pub const DATA_HEADER: [&str; 8] = [
    "sensor_id", "timestamp", "avgT", "avgH", "minT", "maxT", "medT", "medH",
];

pub const STATS_HEADER: [&str; 11] = [
    "sensor_id", "avgT", "stdT", "minT", "maxT", "countT", "avgH", "stdH", "minH", "maxH", "countH",
];

/// Absent values export as empty cells.
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn cell_count(count: usize) -> String {
    count.to_string()
}

/// Raw samples of both sensors, one row per sample, sensor A first.
/// The layout is what `data::loader` reads back.
pub fn write_data<W: Write>(bundle: &ComparisonBundle, out: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(DATA_HEADER)?;
    for id in &bundle.ids {
        for s in bundle.series_of(id) {
            wtr.write_record([
                id.clone(),
                s.timestamp.clone(),
                cell(s.avg_t),
                cell(s.avg_h),
                cell(s.min_t),
                cell(s.max_t),
                cell(s.med_t),
                cell(s.med_h),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// One statistics row per sensor.
pub fn write_stats<W: Write>(bundle: &ComparisonBundle, out: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(STATS_HEADER)?;
    for id in &bundle.ids {
        let Some(s) = bundle.stats_of(id) else {
            continue;
        };
        wtr.write_record([
            id.clone(),
            cell(s.avg_t),
            cell(s.std_t),
            cell(s.min_t),
            cell(s.max_t),
            cell_count(s.count_t),
            cell(s.avg_h),
            cell(s.std_h),
            cell(s.min_h),
            cell(s.max_h),
            cell_count(s.count_h),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_data(bundle: &ComparisonBundle, path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_data(bundle, file)?;
    tracing::info!("Exported comparison data to {:?}", path);
    Ok(())
}

pub fn export_stats(bundle: &ComparisonBundle, path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_stats(bundle, file)?;
    tracing::info!("Exported comparison stats to {:?}", path);
    Ok(())
}
