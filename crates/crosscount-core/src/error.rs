// crates/crosscount-core/src/error.rs

use thiserror::Error;

use crate::config::ConfigError;
use crate::enrich::EnrichmentError;
use crate::normalize::NormalizeError;
use crate::report::ReportError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: crosscount_parser::ParserError,
    },

    #[error("Normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("Report failed: {0}")]
    Report(#[from] ReportError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No counter files could be loaded from {0}")]
    NoCounterFiles(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
