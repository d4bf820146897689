//! Backend row decoding.
//!
//! Converts backend-specific result rows into [`Row`]s of [`SqlValue`]s,
//! preserving select-list column order. MySQL and PostgreSQL dispatch on the
//! declared column type; SQLite is dynamically typed, so decoding follows the
//! runtime type of each value. A column that cannot be decoded degrades to
//! `Null` with an error log rather than failing the whole query.

use crate::value::{Row, SqlValue};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as SqlxRow, TypeInfo, ValueRef};

/// Logical category for declared column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeCategory {
    Integer,
    Boolean,
    Float,
    Text,
}

/// Classify a declared type name into a logical category.
fn categorize(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("int") || lower.contains("serial") || lower.contains("tiny") {
        return TypeCategory::Integer;
    }
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }
    if lower.contains("float")
        || lower.contains("double")
        || lower.contains("decimal")
        || lower.contains("numeric")
        || lower == "real"
    {
        return TypeCategory::Float;
    }
    // varchar, text, char, date, time, and everything else
    TypeCategory::Text
}

pub fn decode_mysql_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let category = categorize(col.type_info().name());
            (col.name().to_string(), mysql::decode_column(row, idx, category))
        })
        .collect()
}

pub fn decode_pg_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let category = categorize(col.type_info().name());
            (col.name().to_string(), postgres::decode_column(row, idx, category))
        })
        .collect()
}

/// SQLite values carry their own runtime type; the declared type (if any)
/// is ignored.
pub fn decode_sqlite_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| (col.name().to_string(), sqlite::decode_column(row, idx)))
        .collect()
}

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> SqlValue {
        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Text => decode_text(row, idx),
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> SqlValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return SqlValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return SqlValue::Int(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
            return SqlValue::Int(v as i64);
        }
        tracing::error!(column = idx, "failed to decode integer column");
        SqlValue::Null
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> SqlValue {
        match row.try_get::<Option<bool>, _>(idx) {
            Ok(Some(v)) => SqlValue::Bool(v),
            Ok(None) => SqlValue::Null,
            Err(e) => {
                tracing::error!(column = idx, error = %e, "failed to decode boolean column");
                SqlValue::Null
            }
        }
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> SqlValue {
        if let Ok(None) = row.try_get::<Option<f64>, _>(idx) {
            return SqlValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return SqlValue::Float(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return SqlValue::Float(v as f64);
        }
        tracing::error!(column = idx, "failed to decode float column");
        SqlValue::Null
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> SqlValue {
        match row.try_get::<Option<String>, _>(idx) {
            Ok(Some(v)) => SqlValue::Text(v),
            Ok(None) => SqlValue::Null,
            Err(e) => {
                tracing::error!(column = idx, error = %e, "failed to decode text column");
                SqlValue::Null
            }
        }
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> SqlValue {
        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Text => decode_text(row, idx),
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> SqlValue {
        if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
            return SqlValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return SqlValue::Int(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return SqlValue::Int(v as i64);
        }
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return SqlValue::Int(v as i64);
        }
        tracing::error!(column = idx, "failed to decode integer column");
        SqlValue::Null
    }

    fn decode_boolean(row: &PgRow, idx: usize) -> SqlValue {
        match row.try_get::<Option<bool>, _>(idx) {
            Ok(Some(v)) => SqlValue::Bool(v),
            Ok(None) => SqlValue::Null,
            Err(e) => {
                tracing::error!(column = idx, error = %e, "failed to decode boolean column");
                SqlValue::Null
            }
        }
    }

    fn decode_float(row: &PgRow, idx: usize) -> SqlValue {
        if let Ok(None) = row.try_get::<Option<f64>, _>(idx) {
            return SqlValue::Null;
        }
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return SqlValue::Float(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return SqlValue::Float(v as f64);
        }
        tracing::error!(column = idx, "failed to decode float column");
        SqlValue::Null
    }

    fn decode_text(row: &PgRow, idx: usize) -> SqlValue {
        match row.try_get::<Option<String>, _>(idx) {
            Ok(Some(v)) => SqlValue::Text(v),
            Ok(None) => SqlValue::Null,
            Err(e) => {
                tracing::error!(column = idx, error = %e, "failed to decode text column");
                SqlValue::Null
            }
        }
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize) -> SqlValue {
        let raw = match row.try_get_raw(idx) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(column = idx, error = %e, "failed to read column value");
                return SqlValue::Null;
            }
        };
        if raw.is_null() {
            return SqlValue::Null;
        }

        let type_name = raw.type_info().name().to_uppercase();
        match type_name.as_str() {
            "INTEGER" => match row.try_get::<Option<i64>, _>(idx) {
                Ok(Some(v)) => SqlValue::Int(v),
                _ => SqlValue::Null,
            },
            "REAL" => match row.try_get::<Option<f64>, _>(idx) {
                Ok(Some(v)) => SqlValue::Float(v),
                _ => SqlValue::Null,
            },
            "TEXT" => match row.try_get::<Option<String>, _>(idx) {
                Ok(Some(v)) => SqlValue::Text(v),
                _ => SqlValue::Null,
            },
            "BOOLEAN" => match row.try_get::<Option<bool>, _>(idx) {
                Ok(Some(v)) => SqlValue::Bool(v),
                _ => SqlValue::Null,
            },
            other => {
                tracing::error!(column = idx, value_type = other, "unsupported column value type");
                SqlValue::Null
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_integer() {
        assert_eq!(categorize("INT"), TypeCategory::Integer);
        assert_eq!(categorize("BIGINT"), TypeCategory::Integer);
        assert_eq!(categorize("TINYINT"), TypeCategory::Integer);
        assert_eq!(categorize("SERIAL"), TypeCategory::Integer);
        assert_eq!(categorize("int8"), TypeCategory::Integer);
    }

    #[test]
    fn test_categorize_boolean() {
        assert_eq!(categorize("BOOLEAN"), TypeCategory::Boolean);
        assert_eq!(categorize("bool"), TypeCategory::Boolean);
    }

    #[test]
    fn test_categorize_float() {
        assert_eq!(categorize("REAL"), TypeCategory::Float);
        assert_eq!(categorize("DOUBLE"), TypeCategory::Float);
        assert_eq!(categorize("FLOAT4"), TypeCategory::Float);
        assert_eq!(categorize("DECIMAL"), TypeCategory::Float);
    }

    #[test]
    fn test_categorize_text_fallback() {
        assert_eq!(categorize("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize("TEXT"), TypeCategory::Text);
        assert_eq!(categorize("DATETIME"), TypeCategory::Text);
    }
}
