//! Error types for the activity converter

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for converter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting an activity
#[derive(Error, Debug)]
pub enum Error {
    /// The input URL matches neither the activity nor the sequence format
    #[error("Malformed activity reference: {0}")]
    MalformedReference(String),

    /// The metadata does not contain the referenced activity
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// No page could be rendered, so there is nothing to merge
    #[error("Assembly failed: {0}")]
    Assembly(String),

    /// The merged document could not be written
    #[error("Failed to write '{}': {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network error while talking to the metadata service
    #[error("Network error: {0}")]
    Network(String),

    /// The metadata service answered with an unexpected document shape
    #[error("Invalid metadata: {0}")]
    Metadata(String),

    /// Browser launch or protocol failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Failed to render a page snapshot
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Failed to read or merge PDF snapshots
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The secondary document conversion failed
    #[error("Document conversion failed: {0}")]
    Conversion(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}
