//! Import and export error types
//!
//! Any of these aborts the whole import; no partial node or edge list is applied.

use thiserror::Error;

/// Import and export operation errors
#[derive(Error, Debug)]
pub enum ImportExportError {
    /// Top-level document has the wrong shape
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// An element is missing a required field or has the wrong type for it
    #[error("Element {index}: missing or invalid field '{field}'")]
    MissingField {
        /// Position of the offending element in the array
        index: usize,
        /// Field name as it appears in the JSON
        field: String,
    },

    /// Node `type` tag is not one we know
    #[error("Element {index}: unknown node type '{kind}'")]
    UnknownNodeType {
        /// Position of the offending element in the array
        index: usize,
        /// Tag found in the file
        kind: String,
    },

    /// Two elements share an id
    #[error("Duplicate id '{0}'")]
    DuplicateId(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportExportError {
    /// Check if this is a validation problem with the document itself
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ImportExportError::InvalidFormat(_)
                | ImportExportError::MissingField { .. }
                | ImportExportError::UnknownNodeType { .. }
                | ImportExportError::DuplicateId(_)
                | ImportExportError::Serialization(_)
        )
    }

    /// Get error code for CLI and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ImportExportError::InvalidFormat(_)
            | ImportExportError::MissingField { .. }
            | ImportExportError::UnknownNodeType { .. }
            | ImportExportError::DuplicateId(_) => "VALIDATION_FAILED",
            ImportExportError::Serialization(_) => "SERIALIZATION_ERROR",
            ImportExportError::FileNotFound(_) => "NOT_FOUND",
            ImportExportError::Io(_) => "IO_ERROR",
        }
    }
}
