/// Query Execution Module
///
/// The four data-access operations on [`Database`]: `query`, `insert`,
/// `update` and `delete`. Each call locks the connection, prepares one
/// statement, binds values as parameters and executes it. Driver failures are
/// reported as the operation's own `DaoError` variant.

use crate::core::db::connection::Database;
use crate::core::db::row::{Fields, Row};
use crate::core::db::statement::{build_delete, build_insert, build_update, BoundSql};
use crate::core::{DaoError, Result};
use rusqlite::types::{ToSql, Value};
use rusqlite::{params_from_iter, Statement};
use tracing::{debug, error};

/// Parameters bound to a `query` statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// The statement has no placeholders.
    #[default]
    None,
    /// Values for `?` / `?N` placeholders, in order.
    Positional(Vec<Value>),
    /// Values for `:name`, `@name` or `$name` placeholders.
    Named(Vec<(String, Value)>),
}

impl Params {
    /// Positional parameters from anything convertible into SQLite values.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Named parameters. A name without a `:`, `@` or `$` prefix gets `:`.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(name, value)| (placeholder_name(name.into()), value.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Positional(values) => values.is_empty(),
            Params::Named(pairs) => pairs.is_empty(),
        }
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl<const N: usize> From<[Value; N]> for Params {
    fn from(values: [Value; N]) -> Self {
        Params::Positional(values.into())
    }
}

impl From<Fields> for Params {
    fn from(fields: Fields) -> Self {
        Params::named(fields.iter().map(|(c, v)| (c.to_string(), v.clone())))
    }
}

fn placeholder_name(name: String) -> String {
    if name.starts_with([':', '@', '$']) {
        name
    } else {
        format!(":{}", name)
    }
}

impl Database {
    /// Executes a read statement and returns every row it produces.
    ///
    /// # Arguments
    ///
    /// * `sql` - The SQL statement to execute
    /// * `params` - Values bound to its placeholders (`()` for none)
    ///
    /// # Errors
    ///
    /// Returns `DaoError::Query` if the statement cannot be prepared, a
    /// parameter cannot be bound, or execution fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rusqlite::types::Value;
    /// use sqldao::Database;
    ///
    /// let db = Database::instance()?;
    /// let rows = db.query("SELECT * FROM users WHERE id = ?", [Value::Integer(1)])?;
    /// # Ok::<(), sqldao::DaoError>(())
    /// ```
    pub fn query(&self, sql: &str, params: impl Into<Params>) -> Result<Vec<Row>> {
        let params = params.into();
        debug!("query: {}", sql);

        let conn = self.lock(DaoError::Query)?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| translate(DaoError::Query, sql, e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let result = match &params {
            Params::None => collect_rows(&mut stmt, [], &columns),
            Params::Positional(values) => {
                collect_rows(&mut stmt, params_from_iter(values.iter()), &columns)
            }
            Params::Named(pairs) => {
                check_named_coverage(&stmt, pairs)?;
                let named: Vec<(&str, &dyn ToSql)> = pairs
                    .iter()
                    .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
                    .collect();
                collect_rows(&mut stmt, named.as_slice(), &columns)
            }
        };

        match result {
            Ok(rows) => {
                debug!("query returned {} rows", rows.len());
                Ok(rows)
            }
            Err(e) => Err(translate(DaoError::Query, sql, e)),
        }
    }

    /// Inserts one row and returns its generated row id.
    ///
    /// The column list comes from the keys of `data` in order; empty `data`
    /// inserts a row of defaults.
    ///
    /// # Errors
    ///
    /// Returns `DaoError::Insert` on an unknown table or column, a constraint
    /// violation, or any other driver failure.
    pub fn insert(&self, table: &str, data: &Fields) -> Result<i64> {
        let stmt = build_insert(table, data);
        let conn = self.lock(DaoError::Insert)?;
        execute(&conn, &stmt, DaoError::Insert)?;
        let id = conn.last_insert_rowid();
        debug!("insert into {} generated id {}", table, id);
        Ok(id)
    }

    /// Sets the `data` columns on every row of `table` matching all `where_`
    /// equalities, and returns the number of rows changed.
    ///
    /// Predicate values are bound as `:where_<column>` so a column may appear
    /// in both `data` and `where_`.
    ///
    /// # Errors
    ///
    /// Returns `DaoError::Update` for empty `data` or `where_`, colliding
    /// parameter names, or a driver failure.
    pub fn update(&self, table: &str, data: &Fields, where_: &Fields) -> Result<usize> {
        let stmt = build_update(table, data, where_)?;
        let conn = self.lock(DaoError::Update)?;
        let changed = execute(&conn, &stmt, DaoError::Update)?;
        debug!("update on {} changed {} rows", table, changed);
        Ok(changed)
    }

    /// Deletes every row of `table` matching all `where_` equalities, and
    /// returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `DaoError::Delete` for an empty `where_` or a driver failure.
    pub fn delete(&self, table: &str, where_: &Fields) -> Result<usize> {
        let stmt = build_delete(table, where_)?;
        let conn = self.lock(DaoError::Delete)?;
        let removed = execute(&conn, &stmt, DaoError::Delete)?;
        debug!("delete from {} removed {} rows", table, removed);
        Ok(removed)
    }

    /// Runs one or more parameterless statements, e.g. schema setup.
    ///
    /// # Errors
    ///
    /// Returns `DaoError::Query` if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!("batch: {}", sql);
        let conn = self.lock(DaoError::Query)?;
        conn.execute_batch(sql)
            .map_err(|e| translate(DaoError::Query, sql, e))
    }
}

/// Every placeholder of `stmt` must have a value in `pairs`; an unbound
/// named parameter would otherwise read as NULL.
fn check_named_coverage(stmt: &Statement<'_>, pairs: &[(String, Value)]) -> Result<()> {
    for index in 1..=stmt.parameter_count() {
        match stmt.parameter_name(index) {
            Some(name) if pairs.iter().any(|(n, _)| n == name) => {}
            Some(name) => {
                return Err(DaoError::Query(format!("missing value for parameter {}", name)))
            }
            None => {
                return Err(DaoError::Query(format!(
                    "missing value for positional parameter {} in a statement bound by name",
                    index
                )))
            }
        }
    }
    Ok(())
}

fn collect_rows<P: rusqlite::Params>(
    stmt: &mut Statement<'_>,
    params: P,
    columns: &[String],
) -> rusqlite::Result<Vec<Row>> {
    let rows = stmt.query_map(params, |row| {
        let values = (0..columns.len())
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Row::new(columns.to_vec(), values))
    })?;
    rows.collect()
}

fn execute(
    conn: &rusqlite::Connection,
    stmt: &BoundSql,
    kind: fn(String) -> DaoError,
) -> Result<usize> {
    debug!("execute: {}", stmt.sql);
    let mut prepared = conn
        .prepare(&stmt.sql)
        .map_err(|e| translate(kind, &stmt.sql, e))?;
    prepared
        .execute(stmt.named_params().as_slice())
        .map_err(|e| translate(kind, &stmt.sql, e))
}

/// Logs a driver failure and wraps its message in the operation's error kind.
fn translate(kind: fn(String) -> DaoError, sql: &str, err: rusqlite::Error) -> DaoError {
    error!("Statement failed: {} ({})", err, sql);
    kind(err.to_string())
}
