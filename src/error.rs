//! Error taxonomy for the pipeline
//!
//! Every variant is terminal for a run: nothing is retried and partially
//! inserted documents are left in place.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("input is not valid {encoding}: {reason}")]
    Encoding { encoding: String, reason: String },

    #[error("input is missing required column '{0}'")]
    MissingColumn(String),

    /// `line` is the 1-based line in the input file, header included
    #[error("line {line}: unparsable InvoiceDate '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("document store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<mongodb::bson::document::ValueAccessError> for PipelineError {
    fn from(err: mongodb::bson::document::ValueAccessError) -> Self {
        PipelineError::MalformedDocument(err.to_string())
    }
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for PipelineError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PipelineError::Chart(err.to_string())
    }
}

/// Result alias used by every library module
pub type Result<T> = std::result::Result<T, PipelineError>;
