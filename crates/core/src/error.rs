//! Error types for presentation text extraction and rewriting.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening, rewriting or saving a presentation.
///
/// A change whose target cannot be found is not an error: it is reported as
/// a skipped [`crate::ChangeOutcome`] and processing continues.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The document could not be opened (missing parts, unreadable package).
    #[error("Failed to open presentation: {0}")]
    DocumentOpen(String),

    /// The modification payload is malformed.
    #[error("Invalid modification payload: {0}")]
    Payload(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Group shapes nest deeper than the supported limit.
    #[error("Group shapes nested deeper than {depth} levels")]
    ShapeNestingTooDeep { depth: usize },

    /// Anything else that should never happen.
    #[error("Unexpected error: {0}")]
    Internal(String),
}

/// The externally visible failure classes of a whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input document failed to open.
    DocumentOpen,
    /// The modification payload was rejected before any mutation.
    InvalidPayload,
    /// Unexpected internal failure.
    Internal,
}

impl Error {
    /// Classify this error for structured error reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IoError(_)
            | Error::DocumentOpen(_)
            | Error::XmlError(_)
            | Error::ZipError(_)
            | Error::ShapeNestingTooDeep { .. } => ErrorKind::DocumentOpen,
            Error::Payload(_) => ErrorKind::InvalidPayload,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Payload(e.to_string())
    }
}
