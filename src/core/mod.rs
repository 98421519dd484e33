/// Core Module for sqldao
///
/// This module contains the connection handle, the row and field types,
/// the SQL builders and the error taxonomy shared by every operation.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DaoError, Result};
