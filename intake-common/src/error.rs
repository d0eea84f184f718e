//! Common error types for the intake pipeline
//!
//! Validation failures and duplicate-filename violations are *not*
//! error values: they are recorded in the error-tracking snapshot and
//! routed to uploaders. The variants here cover the failures that
//! abort a center run or must be surfaced to operators.

use thiserror::Error;

/// Common result type for intake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types across the intake pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// A file group violates structural constraints (for example, more
    /// than two entities validated as one unit). Fatal for the
    /// center's run; never sent to uploaders.
    #[error("Structural error: {0}")]
    Structural(String),

    /// A snapshot diff failed to apply against a persisted table.
    /// Fatal for the run. There is no cross-table transaction, so a
    /// sibling table may already have been written; the message names
    /// the table so operators can reconcile.
    #[error("Persistence error on table '{table}': {source}")]
    Persistence {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notification delivery collaborator failure
    #[error("Notification error: {0}")]
    Notification(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error from a collaborator
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
