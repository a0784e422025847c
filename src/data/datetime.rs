use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Naive ISO forms accepted when a timestamp carries no offset. Read as UTC.
pub const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const MS_PER_MINUTE: f64 = 60_000.0;

/// Parse an ISO-8601 string to a UTC instant.
/// Tries RFC 3339 first (e.g. `2024-05-01T10:00:00.000Z`), then the naive forms.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for &fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Minutes since the Unix epoch, used as the regression x-axis.
///
/// Millisecond epochs squared overflow the useful precision of f64 in the
/// OLS cross-terms; minutes keep them in range. Returns `None` for
/// unparseable input rather than a NaN.
pub fn to_epoch_minutes(value: &str) -> Option<f64> {
    let dt = parse_instant(value)?;
    let minutes = dt.timestamp_millis() as f64 / MS_PER_MINUTE;
    minutes.is_finite().then_some(minutes)
}

/// Render epoch minutes as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_epoch_minutes(minutes: f64) -> Option<String> {
    if !minutes.is_finite() {
        return None;
    }
    let millis = (minutes * MS_PER_MINUTE).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Format an ISO timestamp as `DD/MM/YYYY HH:MM`, falling back to the input.
pub fn format_short_date(iso: &str) -> String {
    match parse_instant(iso) {
        Some(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        None => iso.to_string(),
    }
}
