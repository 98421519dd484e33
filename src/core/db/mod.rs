/// Database Module
///
/// This module provides the data-access object and its supporting types,
/// organized into focused submodules.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): opens and validates the single
///   connection and owns the process-wide instance
/// - **Rows and Fields** (`row.rs`): ordered column/value containers for results and inputs
/// - **Statement Building** (`statement.rs`): generates INSERT/UPDATE/DELETE text and bindings
/// - **Operations** (`query.rs`): `query`, `insert`, `update` and `delete`
///
/// ## Error Handling
///
/// Every operation translates driver failures into its own `DaoError` variant.
///
/// ## Identifiers
///
/// Table and column names are interpolated into SQL text as given. Only values
/// are bound as parameters, so identifiers must come from trusted code.
pub mod connection;
pub mod query;
pub mod row;
pub mod statement;

pub use connection::*;
pub use query::*;
pub use row::*;
pub use statement::*;
