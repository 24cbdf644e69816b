//! Domain-specific error types for lineage-core
//!
//! # Error Categories
//!
//! - **GraphError**: store operations that reference missing nodes or edges,
//!   invalid parent links and parent cycles
//! - **ImportExportError**: malformed snapshot JSON and file handling
//! - **PersistenceError**: snapshot load/save failures; these are reported by the
//!   persistence worker and never returned from a store operation
//!
//! # Examples
//!
//! ```rust
//! use lineage::errors::{GraphError, ImportExportError};
//!
//! let err = GraphError::NodeNotFound("node-1".to_string());
//! assert!(err.is_not_found());
//!
//! let err = ImportExportError::MissingField {
//!     index: 3,
//!     field: "id".to_string(),
//! };
//! assert_eq!(err.error_code(), "VALIDATION_FAILED");
//! ```

pub mod graph;
pub mod import_export;
pub mod persistence;

pub use graph::GraphError;
pub use import_export::ImportExportError;
pub use persistence::PersistenceError;

/// Result type alias for graph store operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for import/export operations
pub type ImportExportResult<T> = Result<T, ImportExportError>;

/// Result type alias for persistence adapters
pub type PersistenceResult<T> = Result<T, PersistenceError>;
