//! Per-file error types for result file ingestion.

use std::path::PathBuf;

/// Errors raised while turning one result file into a peak row.
///
/// Every variant is scoped to a single file: the batch excludes the file,
/// records it as skipped and carries on.
#[derive(Debug, thiserror::Error)]
pub enum EnsembleError {
    /// Returned when a file name lacks the event, duration or temporal
    /// pattern token.
    #[error("cannot parse run identity from \"{filename}\": no {field} token")]
    Parse {
        /// File name that was parsed.
        filename: String,
        /// Which token was missing.
        field: &'static str,
    },

    /// Returned when the file is empty or has a header but no data rows.
    #[error("no data rows in {path}")]
    EmptyInput {
        /// Path to the result file.
        path: PathBuf,
    },

    /// Returned when no row carries the `Flow` header marker.
    #[error("no header row containing \"Flow\" in {path}")]
    MissingHeader {
        /// Path to the result file.
        path: PathBuf,
    },

    /// Returned when the first row is too narrow to hold a label column
    /// and a time column.
    #[error("header of {path} is {width} columns wide, need at least 2")]
    NarrowHeader {
        /// Path to the result file.
        path: PathBuf,
        /// Width of the first row.
        width: usize,
    },

    /// Returned when the file cannot be opened.
    #[error("cannot read {path}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser rejects a record.
    #[error("CSV parse error in {path}")]
    Csv {
        /// Path to the result file.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}
