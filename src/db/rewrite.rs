//! Portable-statement rewriting.
//!
//! Statement templates use a portable `?` value marker and backtick-quoted
//! identifiers. MySQL and SQLite accept both natively; PostgreSQL needs `$1`,
//! `$2`, ... markers and double-quoted identifiers. The rewrite is a literal
//! one-to-one character substitution with no escaping rules - caller values
//! never enter statement text (they are always bound), so a `?` or backtick
//! in SQL is always a marker or an identifier quote.

use crate::db::pool::Backend;
use std::borrow::Cow;

/// Rewrite a portable statement for the target backend.
pub fn for_backend(sql: &str, backend: Backend) -> Cow<'_, str> {
    match backend {
        Backend::MySql | Backend::Sqlite => Cow::Borrowed(sql),
        Backend::Postgres => Cow::Owned(to_postgres(sql)),
    }
}

fn to_postgres(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0u32;
    for ch in sql.chars() {
        match ch {
            '?' => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            '`' => out.push('"'),
            _ => out.push(ch),
        }
    }
    out
}
