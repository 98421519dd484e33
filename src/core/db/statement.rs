/// Statement Building Module
///
/// Generates the SQL text and named bindings for `insert`, `update` and
/// `delete`. The builders are pure so the generated text can be checked
/// without a connection.
///
/// Table and column names are written into the SQL verbatim. Values never are:
/// each one is bound through a `:column` parameter (`:where_column` for
/// predicate values of an update).

use crate::core::db::row::Fields;
use crate::core::{DaoError, Result};
use rusqlite::types::{ToSql, Value};
use std::collections::HashSet;

/// Prefix given to bound-parameter names of `WHERE` values in an update.
pub const WHERE_PARAM_PREFIX: &str = "where_";

/// SQL text together with its named parameter bindings, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    pub bindings: Vec<(String, Value)>,
}

impl BoundSql {
    /// Borrows the bindings in the shape rusqlite accepts for named parameters.
    pub fn named_params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

/// Builds `INSERT INTO table (c1, c2) VALUES (:c1, :c2)`.
///
/// Empty `data` yields `INSERT INTO table DEFAULT VALUES`.
pub fn build_insert(table: &str, data: &Fields) -> BoundSql {
    if data.is_empty() {
        return BoundSql {
            sql: format!("INSERT INTO {} DEFAULT VALUES", table),
            bindings: Vec::new(),
        };
    }

    let columns = data.columns().collect::<Vec<_>>().join(", ");
    let placeholders = data
        .columns()
        .map(|c| format!(":{}", c))
        .collect::<Vec<_>>()
        .join(", ");

    BoundSql {
        sql: format!("INSERT INTO {} ({}) VALUES ({})", table, columns, placeholders),
        bindings: bind(data, ""),
    }
}

/// Builds `UPDATE table SET c=:c, ... WHERE w=:where_w AND ...`.
///
/// # Errors
///
/// Returns `DaoError::Update` when `data` or `where_` is empty, or when two
/// bindings end up with the same parameter name.
pub fn build_update(table: &str, data: &Fields, where_: &Fields) -> Result<BoundSql> {
    if data.is_empty() {
        return Err(DaoError::Update(format!("no columns to set on table {}", table)));
    }
    if where_.is_empty() {
        return Err(DaoError::Update(format!(
            "refusing to update table {} without a WHERE condition",
            table
        )));
    }

    let set_clause = data
        .columns()
        .map(|c| format!("{} = :{}", c, c))
        .collect::<Vec<_>>()
        .join(", ");
    let where_clause = where_clause(where_, WHERE_PARAM_PREFIX);

    let mut bindings = bind(data, "");
    bindings.extend(bind(where_, WHERE_PARAM_PREFIX));

    let mut seen = HashSet::new();
    if let Some((name, _)) = bindings.iter().find(|(name, _)| !seen.insert(name.as_str())) {
        return Err(DaoError::Update(format!(
            "parameter {} is bound by both SET and WHERE",
            name
        )));
    }

    Ok(BoundSql {
        sql: format!("UPDATE {} SET {} WHERE {}", table, set_clause, where_clause),
        bindings,
    })
}

/// Builds `DELETE FROM table WHERE c=:c AND ...`.
///
/// # Errors
///
/// Returns `DaoError::Delete` when `where_` is empty.
pub fn build_delete(table: &str, where_: &Fields) -> Result<BoundSql> {
    if where_.is_empty() {
        return Err(DaoError::Delete(format!(
            "refusing to delete from table {} without a WHERE condition",
            table
        )));
    }

    Ok(BoundSql {
        sql: format!("DELETE FROM {} WHERE {}", table, where_clause(where_, "")),
        bindings: bind(where_, ""),
    })
}

fn where_clause(where_: &Fields, prefix: &str) -> String {
    where_
        .columns()
        .map(|c| format!("{} = :{}{}", c, prefix, c))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn bind(fields: &Fields, prefix: &str) -> Vec<(String, Value)> {
    fields
        .iter()
        .map(|(c, v)| (format!(":{}{}", prefix, c), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn user() -> Fields {
        Fields::new()
            .with("name", "Alice".to_string())
            .with("age", 30)
    }

    #[test]
    fn test_build_insert() {
        let stmt = build_insert("users", &user());
        assert_snapshot!(stmt.sql, @"INSERT INTO users (name, age) VALUES (:name, :age)");
        assert_eq!(stmt.bindings[0], (":name".to_string(), Value::Text("Alice".to_string())));
        assert_eq!(stmt.bindings[1], (":age".to_string(), Value::Integer(30)));
    }

    #[test]
    fn test_build_insert_without_columns() {
        let stmt = build_insert("counters", &Fields::new());
        assert_snapshot!(stmt.sql, @"INSERT INTO counters DEFAULT VALUES");
        assert!(stmt.bindings.is_empty());
    }

    #[test]
    fn test_build_update_prefixes_where_parameters() {
        let data = Fields::new().with("age", 31);
        let where_ = Fields::new().with("name", "Alice".to_string()).with("age", 30);
        let stmt = build_update("users", &data, &where_).unwrap();
        assert_snapshot!(
            stmt.sql,
            @"UPDATE users SET age = :age WHERE name = :where_name AND age = :where_age"
        );
        let names: Vec<&str> = stmt.bindings.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![":age", ":where_name", ":where_age"]);
        assert_eq!(stmt.bindings[2].1, Value::Integer(30));
    }

    #[test]
    fn test_build_update_rejects_colliding_parameters() {
        let data = Fields::new().with("where_id", 5);
        let where_ = Fields::new().with("id", 1);
        match build_update("t", &data, &where_) {
            Err(DaoError::Update(msg)) => assert!(msg.contains(":where_id")),
            other => panic!("Expected Update error, got {:?}", other),
        }
    }

    #[test]
    fn test_build_update_rejects_empty_inputs() {
        assert!(matches!(
            build_update("users", &Fields::new(), &user()),
            Err(DaoError::Update(_))
        ));
        assert!(matches!(
            build_update("users", &user(), &Fields::new()),
            Err(DaoError::Update(_))
        ));
    }

    #[test]
    fn test_build_delete() {
        let stmt = build_delete("users", &user()).unwrap();
        assert_snapshot!(stmt.sql, @"DELETE FROM users WHERE name = :name AND age = :age");
        assert_eq!(stmt.named_params().len(), 2);

        assert!(matches!(
            build_delete("users", &Fields::new()),
            Err(DaoError::Delete(_))
        ));
    }
}
