//! Record validation against the table registry. Produces the ordered column assignments
//! the SQL builder consumes.

use crate::config::{ColumnDef, ColumnKind, TableDef, CREATED_AT_COLUMN, UPDATED_AT_COLUMN};
use crate::error::AppError;
use crate::sql::{Assignment, SqlParam};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub struct RecordValidator;

impl RecordValidator {
    /// Validate a create body. Required columns without a default must be present and non-null.
    /// Columns with a default may be omitted but not sent as null.
    /// `id` may be supplied; `created_at` and `updated_at` are ignored.
    pub fn for_insert(table: &TableDef, record: &Map<String, Value>) -> Result<Vec<Assignment>, AppError> {
        reject_unknown(table, record)?;
        let mut out = Vec::new();
        for c in table.columns {
            if c.name == CREATED_AT_COLUMN || c.name == UPDATED_AT_COLUMN {
                continue;
            }
            match record.get(c.name) {
                None | Some(Value::Null) if !c.nullable && c.default.is_none() => {
                    return Err(AppError::BadRequest(format!("{} is required", c.name)));
                }
                None => continue,
                Some(Value::Null) if !c.nullable => {
                    return Err(AppError::BadRequest(format!("{} cannot be null", c.name)));
                }
                Some(v) => {
                    validate_field(table, c, v)?;
                    out.push(assignment(c, v));
                }
            }
        }
        Ok(out)
    }

    /// Validate an update body. Only supplied columns are checked; `id` and the timestamps are skipped.
    pub fn for_update(table: &TableDef, record: &Map<String, Value>) -> Result<Vec<Assignment>, AppError> {
        reject_unknown(table, record)?;
        let mut out = Vec::new();
        for c in table.writable_columns() {
            let Some(v) = record.get(c.name) else { continue };
            if v.is_null() && !c.nullable {
                return Err(AppError::BadRequest(format!("{} cannot be null", c.name)));
            }
            validate_field(table, c, v)?;
            out.push(assignment(c, v));
        }
        Ok(out)
    }
}

fn assignment(column: &'static ColumnDef, v: &Value) -> Assignment {
    Assignment {
        column,
        value: SqlParam::from_json(v, column.kind),
    }
}

fn reject_unknown(table: &TableDef, record: &Map<String, Value>) -> Result<(), AppError> {
    let mut unknown: Vec<&str> = record
        .keys()
        .map(String::as_str)
        .filter(|k| table.column(k).is_none())
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(AppError::BadRequest(format!(
        "unknown column(s) for {}: {}",
        table.name,
        unknown.join(", ")
    )))
}

fn validate_field(table: &TableDef, c: &ColumnDef, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    let ok = match c.kind {
        ColumnKind::Json | ColumnKind::Text => true,
        ColumnKind::Integer => {
            v.as_i64().is_some_and(|n| i32::try_from(n).is_ok())
                || v.as_str().is_some_and(|s| s.trim().parse::<i32>().is_ok())
        }
        ColumnKind::Float => v.is_number() || v.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok()),
        ColumnKind::Boolean => v.is_boolean(),
        ColumnKind::Uuid => v.as_str().is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
        ColumnKind::Timestamp => v.as_str().is_some_and(is_timestamp),
        ColumnKind::Date => v.as_str().is_some_and(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
    };
    if !ok {
        return Err(AppError::BadRequest(format!(
            "{} must be a valid {}",
            c.name,
            kind_label(c.kind)
        )));
    }
    if table.name == "users" && c.name == "email" {
        if let Some(s) = v.as_str() {
            if !email_re().is_match(s) {
                return Err(AppError::BadRequest("email must be a valid email".into()));
            }
        }
    }
    Ok(())
}

fn kind_label(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Uuid => "UUID",
        ColumnKind::Text => "string",
        ColumnKind::Integer => "integer",
        ColumnKind::Float => "number",
        ColumnKind::Boolean => "boolean",
        ColumnKind::Timestamp => "timestamp",
        ColumnKind::Date => "date (YYYY-MM-DD)",
        ColumnKind::Json => "JSON value",
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// RFC 3339, a date-time without offset (`2024-05-01 08:30:00`), or a plain date.
fn is_timestamp(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || NAIVE_DATETIME_FORMATS
            .iter()
            .any(|f| chrono::NaiveDateTime::parse_from_str(s, f).is_ok())
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
