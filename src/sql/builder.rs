//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for a registered table.
//! Every statement projects one JSON column named `row` holding the whole record.

use crate::config::{ColumnDef, TableDef, CREATED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};
use crate::sql::SqlParam;

/// Hard cap on rows returned by any list statement.
pub const MAX_LIST_ROWS: u32 = 100;

const ALIAS: &str = "t";
const ROW: &str = "row_to_json(t) AS \"row\"";

/// Quote identifier for PostgreSQL (safe: only from the table registry).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// A column paired with the value to write into it.
#[derive(Clone, Debug)]
pub struct Assignment {
    pub column: &'static ColumnDef,
    pub value: SqlParam,
}

#[derive(Clone, Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Push a parameter and return its cast placeholder, e.g. `$2::integer`.
    fn push_param(&mut self, v: SqlParam, pg_type: &str) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), pg_type)
    }
}

fn id_placeholder(q: &mut QueryBuf, table: &TableDef, id: &str) -> String {
    let pg_type = table
        .column(ID_COLUMN)
        .map(|c| c.kind.pg_type())
        .unwrap_or("text");
    q.push_param(SqlParam::text(id), pg_type)
}

/// Newest rows first, capped at `MAX_LIST_ROWS`.
pub fn select_recent(table: &TableDef, limit: u32, offset: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let limit = limit.min(MAX_LIST_ROWS);
    let offset_clause = if offset > 0 { format!(" OFFSET {}", offset) } else { String::new() };
    q.sql = format!(
        "SELECT {} FROM {} {} ORDER BY {}.{} DESC LIMIT {}{}",
        ROW,
        quoted(table.name),
        ALIAS,
        ALIAS,
        quoted(CREATED_AT_COLUMN),
        limit,
        offset_clause
    );
    q
}

/// Row count for pagination, as `{"total": n}`.
pub fn count(table: &TableDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT json_build_object('total', count(*)) AS \"row\" FROM {}",
        quoted(table.name)
    );
    q
}

pub fn select_by_id(table: &TableDef, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = id_placeholder(&mut q, table, id);
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.{} = {}",
        ROW,
        quoted(table.name),
        ALIAS,
        ALIAS,
        quoted(ID_COLUMN),
        ph
    );
    q
}

/// INSERT one row. Column names and placeholders are produced in the same pass over
/// `assignments`, so parameter positions always match their columns.
pub fn insert(table: &TableDef, assignments: &[Assignment]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(assignments.len());
    let mut placeholders = Vec::with_capacity(assignments.len());
    for a in assignments {
        cols.push(quoted(a.column.name));
        placeholders.push(q.push_param(a.value.clone(), a.column.kind.pg_type()));
    }
    let values = if cols.is_empty() {
        "DEFAULT VALUES".to_string()
    } else {
        format!("({}) VALUES ({})", cols.join(", "), placeholders.join(", "))
    };
    q.sql = format!(
        "INSERT INTO {} AS {} {} RETURNING {}",
        quoted(table.name),
        ALIAS,
        values,
        ROW
    );
    q
}

/// UPDATE by id. `updated_at` is always refreshed, even when no other column changes.
pub fn update(table: &TableDef, id: &str, assignments: &[Assignment]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(assignments.len() + 1);
    for a in assignments {
        if a.column.name == ID_COLUMN || a.column.name == UPDATED_AT_COLUMN {
            continue;
        }
        let ph = q.push_param(a.value.clone(), a.column.kind.pg_type());
        sets.push(format!("{} = {}", quoted(a.column.name), ph));
    }
    if table.column(UPDATED_AT_COLUMN).is_some() {
        sets.push(format!("{} = NOW()", quoted(UPDATED_AT_COLUMN)));
    }
    let id_ph = id_placeholder(&mut q, table, id);
    q.sql = format!(
        "UPDATE {} AS {} SET {} WHERE {}.{} = {} RETURNING {}",
        quoted(table.name),
        ALIAS,
        sets.join(", "),
        ALIAS,
        quoted(ID_COLUMN),
        id_ph,
        ROW
    );
    q
}

pub fn delete(table: &TableDef, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = id_placeholder(&mut q, table, id);
    q.sql = format!(
        "DELETE FROM {} AS {} WHERE {}.{} = {} RETURNING {}",
        quoted(table.name),
        ALIAS,
        ALIAS,
        quoted(ID_COLUMN),
        ph,
        ROW
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup;

    fn assign(table: &TableDef, col: &str, v: &str) -> Assignment {
        Assignment {
            column: table.column(col).unwrap(),
            value: SqlParam::text(v),
        }
    }

    #[test]
    fn list_orders_newest_first_and_caps() {
        let t = lookup("mood_entries").unwrap();
        let q = select_recent(t, 5000, 0);
        assert_eq!(
            q.sql,
            "SELECT row_to_json(t) AS \"row\" FROM \"mood_entries\" t ORDER BY t.\"created_at\" DESC LIMIT 100"
        );
        assert!(q.params.is_empty());
        assert!(select_recent(t, 20, 40).sql.ends_with("LIMIT 20 OFFSET 40"));
    }

    #[test]
    fn insert_binds_columns_and_values_in_one_order() {
        let t = lookup("mood_entries").unwrap();
        let q = insert(t, &[assign(t, "user_id", "u1"), assign(t, "mood_score", "7")]);
        assert_eq!(
            q.sql,
            "INSERT INTO \"mood_entries\" AS t (\"user_id\", \"mood_score\") VALUES ($1::text, $2::integer) RETURNING row_to_json(t) AS \"row\""
        );
        assert_eq!(q.params, vec![SqlParam::text("u1"), SqlParam::text("7")]);
    }

    #[test]
    fn insert_without_columns_uses_defaults() {
        let t = lookup("burnout_metrics").unwrap();
        let q = insert(t, &[]);
        assert!(q.sql.contains("DEFAULT VALUES"));
    }

    #[test]
    fn update_skips_id_and_touches_updated_at() {
        let t = lookup("mood_entries").unwrap();
        let q = update(
            t,
            "0b7c5b6e-8e0a-4a53-9d1a-7b5f3f3c2a10",
            &[assign(t, "id", "other"), assign(t, "notes", "better")],
        );
        assert_eq!(
            q.sql,
            "UPDATE \"mood_entries\" AS t SET \"notes\" = $1::text, \"updated_at\" = NOW() WHERE t.\"id\" = $2::uuid RETURNING row_to_json(t) AS \"row\""
        );
        assert_eq!(q.params.len(), 2);
        assert_eq!(q.params[1], SqlParam::text("0b7c5b6e-8e0a-4a53-9d1a-7b5f3f3c2a10"));
    }

    #[test]
    fn update_with_empty_body_still_touches_updated_at() {
        let t = lookup("eco_habits").unwrap();
        let q = update(t, "x", &[]);
        assert!(q.sql.contains("SET \"updated_at\" = NOW() WHERE"));
        assert_eq!(q.params, vec![SqlParam::text("x")]);
    }

    #[test]
    fn select_and_delete_by_id_cast_to_uuid() {
        let t = lookup("users").unwrap();
        assert!(select_by_id(t, "x").sql.ends_with("WHERE t.\"id\" = $1::uuid"));
        assert!(delete(t, "x").sql.starts_with("DELETE FROM \"users\" AS t WHERE t.\"id\" = $1::uuid"));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted("a\"b"), "\"a\"\"b\"");
    }
}
