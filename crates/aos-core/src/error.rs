//! Error types for aos-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in aos-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// XML error from the quick-xml crate
    #[error("XML error in '{path}': {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    /// Failed to parse an XML document
    #[error("failed to parse XML '{path}': {message}")]
    XmlParse { path: PathBuf, message: String },

    /// A required catalog document is absent even after provisioning
    #[error("required catalog document not found: '{path}'")]
    DataNotFound { path: PathBuf },

    /// Pasted army-list text is empty or lacks its header lines
    #[error("army list text is empty or missing its header lines")]
    EmptyList,

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
