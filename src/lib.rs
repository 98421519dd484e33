//! A minimal data-access object over a single SQLite connection.
//!
//! [`Database::instance`] hands out the process-wide handle; `query`,
//! `insert`, `update` and `delete` build parameterized SQL from table and
//! column names and translate driver failures into [`DaoError`].

// Core infrastructure modules
pub mod core;

pub mod config;

#[cfg(test)]
pub mod test_utils;

pub use crate::config::{Config, DatabaseConfig};
pub use crate::core::db::{BoundSql, Database, Fields, Params, Row};
pub use crate::core::{DaoError, Result};
pub use rusqlite::types::Value;
