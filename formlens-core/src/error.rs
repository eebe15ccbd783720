//! Error types for formlens-core
//!
//! Only contract violations are errors. Not having enough data to analyze is a
//! normal outcome and is reported inside [`AnalysisResult`](crate::types::AnalysisResult).

use thiserror::Error;

/// Main error type for the formlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Template is recognized but has no analyzer yet
    #[error("analysis template not yet implemented: {0}")]
    NotImplemented(String),

    /// Template name is not one we know about
    #[error("unknown template type: {0}")]
    UnknownTemplate(String),

    /// Field types do not fit the template
    #[error("fields are incompatible with {template} template: primary is {primary}, secondary is {secondary}")]
    IncompatibleFields {
        template: String,
        primary: String,
        secondary: String,
    },

    /// Field id not present in the form definition
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the requested template exists but is unreleased.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Error::NotImplemented(_))
    }
}

/// Result type alias for formlens-core
pub type Result<T> = std::result::Result<T, Error>;
