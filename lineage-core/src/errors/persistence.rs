//! Persistence error types
//!
//! Persistence is best-effort: these errors are logged and broadcast by the
//! persistence worker and never roll back an in-memory mutation.

use thiserror::Error;

use super::ImportExportError;

/// Snapshot load/save errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the backing files failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored snapshot could not be encoded or decoded
    #[error("Snapshot encoding error: {0}")]
    Snapshot(#[from] ImportExportError),

    /// Database operation failed
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Reconciling the snapshot into the database failed
    #[error("Reconciliation failed: {0}")]
    Reconcile(String),

    /// The worker task is gone; the store keeps running in memory only
    #[error("Persistence worker is not running")]
    WorkerClosed,
}
