//! Apply the table registry to the database: idempotent CREATE TABLE for every registered
//! table, an index on each table's created_at, and the shared rate-limit counter table.

use crate::config::{ColumnDef, TableDef, CREATED_AT_COLUMN, ID_COLUMN, TABLES};
use crate::error::AppError;
use crate::ratelimit::RATE_LIMIT_TABLE;
use sqlx::PgPool;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_ddl(c: &ColumnDef) -> String {
    let mut def = format!("{} {}", quote(c.name), c.kind.pg_type());
    if c.name == ID_COLUMN {
        def.push_str(" PRIMARY KEY");
    } else if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(d) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(d);
    }
    def
}

pub fn create_table_ddl(table: &TableDef) -> String {
    let cols: Vec<String> = table.columns.iter().map(column_ddl).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(table.name),
        cols.join(",\n    ")
    )
}

fn created_at_index_ddl(table: &TableDef) -> Option<String> {
    table.column(CREATED_AT_COLUMN)?;
    Some(format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({} DESC)",
        quote(&format!("idx_{}_created_at", table.name)),
        quote(table.name),
        quote(CREATED_AT_COLUMN)
    ))
}

pub fn rate_limit_table_ddl() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            key TEXT NOT NULL,
            window_start TIMESTAMPTZ NOT NULL,
            count BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (key, window_start)
        )
        "#,
        quote(RATE_LIMIT_TABLE)
    )
}

/// Create every registered table (and its created_at index) plus the rate-limit table.
/// Existing tables are left untouched.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for table in TABLES {
        sqlx::query(&create_table_ddl(table)).execute(pool).await?;
        if let Some(idx) = created_at_index_ddl(table) {
            sqlx::query(&idx).execute(pool).await?;
        }
        tracing::debug!(table = table.name, "table ensured");
    }
    sqlx::query(&rate_limit_table_ddl()).execute(pool).await?;
    tracing::info!(tables = TABLES.len(), "schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup;

    #[test]
    fn mood_entries_ddl() {
        let ddl = create_table_ddl(lookup("mood_entries").unwrap());
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"mood_entries\" ("));
        assert!(ddl.contains("\"id\" uuid PRIMARY KEY DEFAULT gen_random_uuid()"));
        assert!(ddl.contains("\"user_id\" text NOT NULL,"));
        assert!(ddl.contains("\"mood_score\" integer NOT NULL,"));
        assert!(ddl.contains("\"emotions\" jsonb,"));
        assert!(ddl.contains("\"updated_at\" timestamptz NOT NULL DEFAULT NOW()"));
    }

    #[test]
    fn every_table_gets_a_created_at_index() {
        for t in TABLES {
            let idx = created_at_index_ddl(t).expect("index");
            assert!(idx.contains(&format!("ON \"{}\" (\"created_at\" DESC)", t.name)));
        }
    }

    #[test]
    fn rate_limit_table_keyed_by_window() {
        assert!(rate_limit_table_ddl().contains("PRIMARY KEY (key, window_start)"));
    }
}
