//! Dataset tables: corpus metadata, per-clip features, durations.

use std::path::PathBuf;

use thiserror::Error;

pub mod builder;
pub mod csv;
pub mod duration;
pub mod metadata;

pub use builder::{BuildSummary, extraction_rows, write_feature_table};
pub use csv::MetadataTable;
pub use duration::{DURATION_COLUMN, append_durations};
pub use metadata::{METADATA_COLUMNS, MetadataError, MetadataRow, scan_corpus, write_metadata_csv};

/// Errors from reading or writing dataset tables.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read table {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write table {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Table {path} is missing required column {column}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Table {path} has no header row")]
    EmptyTable { path: PathBuf },
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}
