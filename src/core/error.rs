/// Error Module
///
/// This module defines the error taxonomy for the data-access object. Every
/// driver failure is translated into the error kind of the operation that
/// observed it, with the original driver message attached.
use thiserror::Error;

/// Error type for all data-access operations.
///
/// There is one variant per public operation:
/// - Opening the connection
/// - Reading rows (`query`, batch execution)
/// - Inserting, updating and deleting rows
///
/// plus configuration and I/O failures encountered while resolving settings.
#[derive(Error, Debug)]
pub enum DaoError {
    /// The connection could not be opened or validated
    #[error("Database connection error: {0}")]
    Connection(String),

    /// A read statement failed to prepare or execute
    #[error("Query error: {0}")]
    Query(String),

    /// An insert failed (constraint violation, unknown table, ...)
    #[error("Insert error: {0}")]
    Insert(String),

    /// An update failed or was rejected before execution
    #[error("Update error: {0}")]
    Update(String),

    /// A delete failed or was rejected before execution
    #[error("Delete error: {0}")]
    Delete(String),

    /// Configuration loading and parsing errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaoError {
    /// Returns true if this error came from opening the connection.
    pub fn is_connection(&self) -> bool {
        matches!(self, DaoError::Connection(_))
    }
}

/// Type alias for Result using `DaoError` as the error type.
pub type Result<T> = std::result::Result<T, DaoError>;
