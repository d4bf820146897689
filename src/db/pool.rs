//! Connection pool management.
//!
//! A [`Database`] owns one bounded pool of live connections, created once at
//! process start and drained at shutdown. It is an explicit owned handle -
//! there is no process-wide pool global, so "query before initialization" is
//! unrepresentable. Connections follow acquire/use/release discipline with
//! release guaranteed on every exit path; acquisition blocks (bounded by the
//! acquire timeout) when the pool is saturated.

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use sqlx::{
    MySqlPool, PgPool, SqlitePool, mysql::MySqlConnectOptions, mysql::MySqlPoolOptions,
    postgres::PgConnectOptions, postgres::PgPoolOptions, sqlite::SqliteConnectOptions,
    sqlite::SqlitePoolOptions,
};
use std::time::Duration;
use tracing::info;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    MySql,
    Postgres,
    Sqlite,
}

impl Backend {
    /// Parse a backend from a URL scheme.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Conventional server port; 0 for SQLite, which has none.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::MySql => 3306,
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Backend-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
    }

    /// Get the backend for this pool.
    pub fn backend(&self) -> Backend {
        match self {
            DbPool::MySql(_) => Backend::MySql,
            DbPool::Postgres(_) => Backend::Postgres,
            DbPool::Sqlite(_) => Backend::Sqlite,
        }
    }
}

/// Owned handle over one database: the pool plus the configured page size.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
    page_size: u64,
}

impl Database {
    /// Create the pool and verify connectivity. Fails if the configuration
    /// is invalid or the server is unreachable.
    pub async fn connect(config: &DbConfig) -> DbResult<Self> {
        config.validate()?;

        info!(
            backend = %config.backend,
            database = %config.database,
            min_size = config.min_size,
            max_size = config.max_size,
            "creating database connection pool"
        );

        let acquire_timeout = Duration::from_secs(config.acquire_timeout_secs);
        let pool = match config.backend {
            Backend::MySql => {
                let options = MySqlConnectOptions::new()
                    .host(&config.host)
                    .port(config.port)
                    .username(&config.user)
                    .password(&config.password)
                    .database(&config.database)
                    .charset(&config.charset);

                let mut pool_options = MySqlPoolOptions::new()
                    .min_connections(config.min_size)
                    .max_connections(config.max_size)
                    .acquire_timeout(acquire_timeout);
                if !config.autocommit {
                    pool_options = pool_options.after_connect(|conn, _meta| {
                        Box::pin(async move {
                            use sqlx::Executor;
                            conn.execute("set autocommit = 0").await?;
                            Ok(())
                        })
                    });
                }

                DbPool::MySql(
                    pool_options
                        .connect_with(options)
                        .await
                        .map_err(DbError::from)?,
                )
            }
            Backend::Postgres => {
                let options = PgConnectOptions::new()
                    .host(&config.host)
                    .port(config.port)
                    .username(&config.user)
                    .password(&config.password)
                    .database(&config.database);

                DbPool::Postgres(
                    PgPoolOptions::new()
                        .min_connections(config.min_size)
                        .max_connections(config.max_size)
                        .acquire_timeout(acquire_timeout)
                        .connect_with(options)
                        .await
                        .map_err(DbError::from)?,
                )
            }
            Backend::Sqlite => {
                let options = SqliteConnectOptions::new()
                    .filename(&config.database)
                    .create_if_missing(true);

                DbPool::Sqlite(
                    SqlitePoolOptions::new()
                        .min_connections(config.min_size)
                        .max_connections(config.max_size)
                        .acquire_timeout(acquire_timeout)
                        .connect_with(options)
                        .await
                        .map_err(DbError::from)?,
                )
            }
        };

        info!(backend = %config.backend, "connected successfully");

        Ok(Self {
            pool,
            page_size: config.page_size,
        })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// The backend this handle talks to.
    pub fn backend(&self) -> Backend {
        self.pool.backend()
    }

    /// The configured rows-per-page for pagination.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Drain the pool. All connections are closed when this returns.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database connection pool closed");
    }
}
