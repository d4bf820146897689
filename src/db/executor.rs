//! Statement execution engine.
//!
//! Runs one SQL statement at a time against a pooled connection: acquire,
//! use, release, with release guaranteed on every exit path including
//! errors. Reads stream at most `row_limit` rows; writes report the affected
//! row count. Failures propagate unchanged to the caller after the
//! connection is back in the pool - there is no retry here.
//!
//! # Architecture
//!
//! The executor dispatches to database-specific submodules (`mysql`,
//! `postgres`, `sqlite`) with identical shape, each binding the unified
//! value type to its driver. Statements are rewritten from the portable
//! placeholder form immediately before execution.

use crate::db::decode;
use crate::db::pool::{Database, DbPool};
use crate::db::rewrite;
use crate::error::{DbError, DbResult};
use crate::value::{Row, SqlValue};
use futures_util::StreamExt;
use tracing::debug;

impl Database {
    /// Execute a SELECT and return rows as ordered column-name to value
    /// mappings. Fetches up to `row_limit` rows, or all rows when `None`.
    /// An empty result is an empty vec, never an error.
    pub async fn execute_query(
        &self,
        sql: &str,
        args: &[SqlValue],
        row_limit: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        let sql = rewrite::for_backend(sql, self.backend());
        debug!(sql = %sql, args = args.len(), limit = ?row_limit, "executing query");

        let rows = match self.pool() {
            DbPool::MySql(pool) => mysql::fetch_rows(pool, &sql, args, row_limit).await?,
            DbPool::Postgres(pool) => postgres::fetch_rows(pool, &sql, args, row_limit).await?,
            DbPool::Sqlite(pool) => sqlite::fetch_rows(pool, &sql, args, row_limit).await?,
        };

        debug!(rows = rows.len(), "rows returned");
        Ok(rows)
    }

    /// Execute an INSERT, UPDATE, or DELETE and return the number of rows
    /// changed.
    pub async fn execute_mutation(&self, sql: &str, args: &[SqlValue]) -> DbResult<u64> {
        let sql = rewrite::for_backend(sql, self.backend());
        debug!(sql = %sql, args = args.len(), "executing mutation");

        let affected = match self.pool() {
            DbPool::MySql(pool) => mysql::execute_write(pool, &sql, args).await?,
            DbPool::Postgres(pool) => postgres::execute_write(pool, &sql, args).await?,
            DbPool::Sqlite(pool) => sqlite::execute_write(pool, &sql, args).await?,
        };

        debug!(affected, "rows affected");
        Ok(affected)
    }
}

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database
// type. The code structure is intentionally parallel to make differences
// obvious.

mod mysql {
    use super::*;
    use sqlx::MySqlPool;
    use sqlx::mysql::{MySqlArguments, MySqlRow};

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        args: &[SqlValue],
        row_limit: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        // When args is empty, use raw SQL to avoid prepared statement issues
        let rows: Vec<MySqlRow> = if args.is_empty() {
            use sqlx::Executor;
            match row_limit {
                Some(limit) => {
                    collect_rows(pool.fetch(sql).take(limit).collect::<Vec<_>>().await)?
                }
                None => pool.fetch_all(sql).await.map_err(DbError::from)?,
            }
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_value(query, arg);
            }
            match row_limit {
                Some(limit) => {
                    collect_rows(query.fetch(pool).take(limit).collect::<Vec<_>>().await)?
                }
                None => query.fetch_all(pool).await.map_err(DbError::from)?,
            }
        };

        Ok(rows.iter().map(decode::decode_mysql_row).collect())
    }

    pub async fn execute_write(pool: &MySqlPool, sql: &str, args: &[SqlValue]) -> DbResult<u64> {
        let result = if args.is_empty() {
            use sqlx::Executor;
            pool.execute(sql).await
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_value(query, arg);
            }
            query.execute(pool).await
        };

        Ok(result.map_err(DbError::from)?.rows_affected())
    }

    fn bind_value<'q>(
        query: sqlx::query::Query<'q, sqlx::MySql, MySqlArguments>,
        value: &'q SqlValue,
    ) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
        match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
        }
    }
}

mod postgres {
    use super::*;
    use sqlx::PgPool;
    use sqlx::postgres::{PgArguments, PgRow};

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        args: &[SqlValue],
        row_limit: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        let rows: Vec<PgRow> = if args.is_empty() {
            use sqlx::Executor;
            match row_limit {
                Some(limit) => {
                    collect_rows(pool.fetch(sql).take(limit).collect::<Vec<_>>().await)?
                }
                None => pool.fetch_all(sql).await.map_err(DbError::from)?,
            }
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_value(query, arg);
            }
            match row_limit {
                Some(limit) => {
                    collect_rows(query.fetch(pool).take(limit).collect::<Vec<_>>().await)?
                }
                None => query.fetch_all(pool).await.map_err(DbError::from)?,
            }
        };

        Ok(rows.iter().map(decode::decode_pg_row).collect())
    }

    pub async fn execute_write(pool: &PgPool, sql: &str, args: &[SqlValue]) -> DbResult<u64> {
        let result = if args.is_empty() {
            use sqlx::Executor;
            pool.execute(sql).await
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_value(query, arg);
            }
            query.execute(pool).await
        };

        Ok(result.map_err(DbError::from)?.rows_affected())
    }

    fn bind_value<'q>(
        query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        value: &'q SqlValue,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqlitePool;
    use sqlx::sqlite::{SqliteArguments, SqliteRow};

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        args: &[SqlValue],
        row_limit: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        let rows: Vec<SqliteRow> = if args.is_empty() {
            use sqlx::Executor;
            match row_limit {
                Some(limit) => {
                    collect_rows(pool.fetch(sql).take(limit).collect::<Vec<_>>().await)?
                }
                None => pool.fetch_all(sql).await.map_err(DbError::from)?,
            }
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_value(query, arg);
            }
            match row_limit {
                Some(limit) => {
                    collect_rows(query.fetch(pool).take(limit).collect::<Vec<_>>().await)?
                }
                None => query.fetch_all(pool).await.map_err(DbError::from)?,
            }
        };

        Ok(rows.iter().map(decode::decode_sqlite_row).collect())
    }

    pub async fn execute_write(pool: &SqlitePool, sql: &str, args: &[SqlValue]) -> DbResult<u64> {
        let result = if args.is_empty() {
            use sqlx::Executor;
            pool.execute(sql).await
        } else {
            let mut query = sqlx::query(sql);
            for arg in args {
                query = bind_value(query, arg);
            }
            query.execute(pool).await
        };

        Ok(result.map_err(DbError::from)?.rows_affected())
    }

    fn bind_value<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
        value: &'q SqlValue,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
        }
    }
}
