//! Convert serde_json::Value into text parameters that PostgreSQL casts to the column type.

use crate::config::ColumnKind;
use serde_json::Value;

/// A bound statement parameter. Every value travels as text and the statement casts it
/// (`$n::integer`, `$n::jsonb`, ...) so one binding path serves every column kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlParam {
    Null,
    Text(String),
}

impl SqlParam {
    /// Text form of a JSON value for a column of `kind`. Objects and arrays are stored as
    /// their JSON serialization; JSON columns store every value serialized so scalars stay valid JSON.
    pub fn from_json(v: &Value, kind: ColumnKind) -> Self {
        match (v, kind) {
            (Value::Null, _) => SqlParam::Null,
            (_, ColumnKind::Json) => SqlParam::Text(v.to_string()),
            (Value::String(s), _) => SqlParam::Text(s.clone()),
            (Value::Bool(b), _) => SqlParam::Text(b.to_string()),
            (Value::Number(n), _) => SqlParam::Text(n.to_string()),
            (Value::Array(_) | Value::Object(_), _) => SqlParam::Text(v.to_string()),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        SqlParam::Text(s.into())
    }

    pub fn as_bind(&self) -> Option<&str> {
        match self {
            SqlParam::Null => None,
            SqlParam::Text(s) => Some(s.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_are_serialized_for_text_columns() {
        let p = SqlParam::from_json(&json!({ "calm": true }), ColumnKind::Text);
        assert_eq!(p, SqlParam::text(r#"{"calm":true}"#));
    }

    #[test]
    fn json_columns_keep_scalars_as_json() {
        assert_eq!(SqlParam::from_json(&json!("joy"), ColumnKind::Json), SqlParam::text(r#""joy""#));
        assert_eq!(SqlParam::from_json(&json!(["a", "b"]), ColumnKind::Json), SqlParam::text(r#"["a","b"]"#));
    }

    #[test]
    fn scalars_use_their_text_form() {
        assert_eq!(SqlParam::from_json(&json!(7), ColumnKind::Integer), SqlParam::text("7"));
        assert_eq!(SqlParam::from_json(&json!(2.5), ColumnKind::Float), SqlParam::text("2.5"));
        assert_eq!(SqlParam::from_json(&json!(false), ColumnKind::Boolean), SqlParam::text("false"));
        assert_eq!(SqlParam::from_json(&json!("u1"), ColumnKind::Text), SqlParam::text("u1"));
    }

    #[test]
    fn null_binds_as_sql_null() {
        let p = SqlParam::from_json(&Value::Null, ColumnKind::Json);
        assert_eq!(p, SqlParam::Null);
        assert_eq!(p.as_bind(), None);
    }
}
