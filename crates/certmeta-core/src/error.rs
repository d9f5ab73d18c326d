//! Error types for the metadata pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while loading field definitions, the banned-character
/// registry, or dotted paths.
///
/// Value coercion never produces an error; a failed coercion is `None`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The banned-character registry could not be read or written.
    #[error("banned character registry {path}: {source}")]
    RegistryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The banned-character registry file is not valid JSON.
    #[error("banned character registry {path} is malformed: {source}")]
    RegistryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A field definition is unusable.
    #[error("invalid field definition '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// A dotted path does not resolve against the order schema.
    #[error("invalid field path '{path}': {message}")]
    InvalidPath { path: String, message: String },
}

/// Result type for pipeline operations.
pub type CoreResult<T> = Result<T, CoreError>;
