//! Error types for loading data and running comparisons.
//! Absent metrics and degenerate regressions are not errors; see `processing`.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading a sample dump from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid config in {}: {reason}", .path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("Unsupported file format: .{0}")]
    UnsupportedFormat(String),
}

/// Failure of the retrieval collaborator. The run is aborted and nothing is cached.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Sensor listing unavailable: {0}")]
    Sensors(String),

    #[error("Sample retrieval failed for window {window}: {reason}")]
    Samples { window: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("Cannot compare sensor '{0}' with itself")]
    SameSensor(String),
}
