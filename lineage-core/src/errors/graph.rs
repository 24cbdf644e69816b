//! Graph store error types
//!
//! Raised synchronously by the store operation that detects them. An operation
//! that returns one of these has not changed any state.

use thiserror::Error;

/// Graph-related errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// Node not found by identifier
    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    /// Edge not found by identifier
    #[error("Edge '{0}' not found")]
    EdgeNotFound(String),

    /// Parent link points at something that cannot hold children
    #[error("Invalid parent '{parent}' for node '{node}': {reason}")]
    InvalidParent {
        /// Child node identifier
        node: String,
        /// Requested parent identifier
        parent: String,
        /// Why the link was refused
        reason: String,
    },

    /// Parent links form a cycle
    #[error("Cycle detected in parent links: {0}")]
    CycleDetected(String),

    /// Database operation failed
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl GraphError {
    /// Check if this is a reference to something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::NodeNotFound(_) | GraphError::EdgeNotFound(_)
        )
    }

    /// Check if this error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        match self {
            #[cfg(feature = "database")]
            GraphError::Database(_) => false,
            _ => true,
        }
    }

    /// Get error code for CLI and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            GraphError::NodeNotFound(_) | GraphError::EdgeNotFound(_) => "NOT_FOUND",
            GraphError::InvalidParent { .. } => "VALIDATION_FAILED",
            GraphError::CycleDetected(_) => "CYCLE_DETECTED",
            #[cfg(feature = "database")]
            GraphError::Database(_) => "DATABASE_ERROR",
        }
    }
}
