#![allow(dead_code)]

//! Shared fixtures for the SQLite-backed integration tests.

use dbmap::schema::{Entity, EntitySchema, FieldDescriptor, next_id, unix_time};
use dbmap::{Database, DbConfig, DbResult, Row, SqlValue};
use std::sync::LazyLock;
use tempfile::NamedTempFile;

/// Install a test subscriber once so `RUST_LOG=dbmap=debug` works.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub admin: Option<bool>,
    pub created_at: Option<f64>,
}

static USER_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::builder("User")
        .table("users")
        .field(
            "id",
            FieldDescriptor::string("varchar(50)")
                .primary_key()
                .default_fn(next_id),
        )
        .field("email", FieldDescriptor::string("varchar(50)"))
        .field("name", FieldDescriptor::string("varchar(50)"))
        .field("admin", FieldDescriptor::boolean())
        .field("created_at", FieldDescriptor::float().default_fn(unix_time))
        .build()
        .expect("users schema")
});

impl Entity for User {
    fn schema() -> &'static EntitySchema {
        &USER_SCHEMA
    }

    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.get("id").and_then(|v| v.as_str()).map(String::from),
            email: row.get("email").and_then(|v| v.as_str()).map(String::from),
            name: row.get("name").and_then(|v| v.as_str()).map(String::from),
            admin: row.get("admin").and_then(|v| v.as_bool()),
            created_at: row.get("created_at").and_then(|v| v.as_f64()),
        })
    }

    fn value(&self, field: &str) -> Option<SqlValue> {
        match field {
            "id" => self.id.clone().map(SqlValue::from),
            "email" => self.email.clone().map(SqlValue::from),
            "name" => self.name.clone().map(SqlValue::from),
            "admin" => self.admin.map(SqlValue::from),
            "created_at" => self.created_at.map(SqlValue::from),
            _ => None,
        }
    }

    fn set_value(&mut self, field: &str, value: SqlValue) {
        match field {
            "id" => self.id = value.as_str().map(String::from),
            "email" => self.email = value.as_str().map(String::from),
            "name" => self.name = value.as_str().map(String::from),
            "admin" => self.admin = value.as_bool(),
            "created_at" => self.created_at = value.as_f64(),
            _ => {}
        }
    }
}

impl User {
    pub fn sample(email: &str, name: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

const CREATE_USERS: &str = "create table users (\
     `id` varchar(50) primary key, \
     `email` varchar(50), \
     `name` varchar(50), \
     `admin` boolean, \
     `created_at` real)";

/// A fresh on-disk SQLite database with the users table created. The temp
/// file handle keeps the database alive for the duration of the test.
pub async fn test_db() -> (Database, NamedTempFile) {
    init_tracing();
    let file = NamedTempFile::new().expect("temp database file");
    let config = DbConfig::sqlite(file.path().to_str().expect("utf-8 temp path"));
    let db = Database::connect(&config).await.expect("connect");
    db.execute_mutation(CREATE_USERS, &[]).await.expect("create table");
    (db, file)
}
