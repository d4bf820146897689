//! Schema mapping engine.
//!
//! Translates a declarative set of field descriptors into an immutable
//! [`EntitySchema`]: table name, primary key, ordered column list, and the
//! four canonical SQL templates (select/insert/update/delete). Built exactly
//! once per entity type, at registration time; value placeholders are always
//! portable `?` markers and identifiers are backtick-quoted so caller data
//! can never collide with statement text.

use crate::error::{DbError, DbResult};
use crate::value::{Row, SqlValue};

/// Default value for a field: absent, a literal, or a zero-argument
/// generator invoked when an unset field is first read for persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    None,
    Value(SqlValue),
    Generator(fn() -> SqlValue),
}

/// Declared metadata for one entity attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Column name override; the declaration-site field name when `None`.
    name: Option<String>,
    column_type: String,
    primary_key: bool,
    default: FieldDefault,
}

impl FieldDescriptor {
    fn new(column_type: impl Into<String>, default: FieldDefault) -> Self {
        Self {
            name: None,
            column_type: column_type.into(),
            primary_key: false,
            default,
        }
    }

    /// A string column with an explicit ddl type, e.g. `"varchar(50)"`.
    pub fn string(ddl: impl Into<String>) -> Self {
        Self::new(ddl, FieldDefault::None)
    }

    /// A `varchar(100)` column.
    pub fn varchar() -> Self {
        Self::string("varchar(100)")
    }

    /// A `boolean` column, defaulting to `false`.
    pub fn boolean() -> Self {
        Self::new("boolean", FieldDefault::Value(SqlValue::Bool(false)))
    }

    /// A `bigint` column, defaulting to `0`.
    pub fn integer() -> Self {
        Self::new("bigint", FieldDefault::Value(SqlValue::Int(0)))
    }

    /// A `real` column, defaulting to `0.0`.
    pub fn float() -> Self {
        Self::new("real", FieldDefault::Value(SqlValue::Float(0.0)))
    }

    /// A `text` column with no default.
    pub fn text() -> Self {
        Self::new("text", FieldDefault::None)
    }

    /// Mark this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Override the column name (otherwise inferred from the declaration
    /// site).
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Use a literal default value.
    pub fn default_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Use a generator default, invoked once per unset field at save time.
    pub fn default_fn(mut self, generator: fn() -> SqlValue) -> Self {
        self.default = FieldDefault::Generator(generator);
        self
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }
}

/// A field after registration: declaration name, resolved column name, and
/// the original descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub column: String,
    pub descriptor: FieldDescriptor,
}

/// Derived, immutable description of how an entity type maps to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    entity: String,
    table: String,
    primary_key: SchemaField,
    fields: Vec<SchemaField>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl EntitySchema {
    /// Start declaring an entity type. The table name defaults to the
    /// entity name.
    pub fn builder(entity: impl Into<String>) -> SchemaBuilder {
        let entity = entity.into();
        SchemaBuilder {
            entity,
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The single primary-key field.
    pub fn primary_key(&self) -> &SchemaField {
        &self.primary_key
    }

    /// Non-key fields in declaration order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Look up any field (key or non-key) by declaration name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        if self.primary_key.name == name {
            return Some(&self.primary_key);
        }
        self.fields.iter().find(|f| f.name == name)
    }

    /// `select <pk>, <col1>, ... from <table>`
    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    /// `insert into <table> (<col1>, ..., <pk>) values (?, ...)`
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// `update <table> set <col1>=?, ... where <pk>=?`
    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    /// `delete from <table> where <pk>=?`
    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }
}

/// Collects field declarations in order and derives the schema.
pub struct SchemaBuilder {
    entity: String,
    table: Option<String>,
    fields: Vec<(String, FieldDescriptor)>,
}

impl SchemaBuilder {
    /// Set an explicit table name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Declare a field. Declaration order is preserved in the schema.
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.push((name.into(), descriptor));
        self
    }

    /// Derive the schema. Fails unless exactly one field is marked as the
    /// primary key.
    pub fn build(self) -> DbResult<EntitySchema> {
        let table = self.table.unwrap_or_else(|| self.entity.clone());

        let mut primary_key: Option<SchemaField> = None;
        let mut fields = Vec::new();
        for (name, descriptor) in self.fields {
            let column = descriptor.name.clone().unwrap_or_else(|| name.clone());
            let field = SchemaField {
                name,
                column,
                descriptor,
            };
            if field.descriptor.primary_key {
                if primary_key.is_some() {
                    return Err(DbError::schema(
                        self.entity.as_str(),
                        format!("duplicate primary key for field '{}'", field.name),
                    ));
                }
                primary_key = Some(field);
            } else {
                fields.push(field);
            }
        }

        let primary_key = primary_key
            .ok_or_else(|| DbError::schema(self.entity.as_str(), "primary key not found"))?;

        let quoted_table = quote(&table);
        let quoted_pk = quote(&primary_key.column);
        let quoted_cols: Vec<String> = fields.iter().map(|f| quote(&f.column)).collect();

        let select_sql = if quoted_cols.is_empty() {
            format!("select {} from {}", quoted_pk, quoted_table)
        } else {
            format!(
                "select {}, {} from {}",
                quoted_pk,
                quoted_cols.join(", "),
                quoted_table
            )
        };

        // Insert binds non-key columns first, primary key last.
        let mut insert_cols = quoted_cols.clone();
        insert_cols.push(quoted_pk.clone());
        let insert_sql = format!(
            "insert into {} ({}) values ({})",
            quoted_table,
            insert_cols.join(", "),
            placeholders(insert_cols.len())
        );

        let set_clause: Vec<String> = quoted_cols.iter().map(|c| format!("{}=?", c)).collect();
        let update_sql = format!(
            "update {} set {} where {}=?",
            quoted_table,
            set_clause.join(", "),
            quoted_pk
        );

        let delete_sql = format!("delete from {} where {}=?", quoted_table, quoted_pk);

        Ok(EntitySchema {
            entity: self.entity,
            table,
            primary_key,
            fields,
            select_sql,
            insert_sql,
            update_sql,
            delete_sql,
        })
    }
}

/// Backtick-quote an identifier at template-build time.
pub(crate) fn quote(ident: &str) -> String {
    format!("`{}`", ident)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// An application entity bound to an [`EntitySchema`].
///
/// Implementations cache the schema in a `LazyLock` so it is derived exactly
/// once per type, process-wide, and never invalidated:
///
/// ```
/// use std::sync::LazyLock;
/// use dbmap::schema::{next_id, Entity, EntitySchema, FieldDescriptor};
/// use dbmap::{DbResult, Row, SqlValue};
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: Option<String>,
///     email: Option<String>,
/// }
///
/// static USER_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
///     EntitySchema::builder("User")
///         .table("users")
///         .field("id", FieldDescriptor::string("varchar(50)").primary_key().default_fn(next_id))
///         .field("email", FieldDescriptor::string("varchar(50)"))
///         .build()
///         .expect("users schema")
/// });
///
/// impl Entity for User {
///     fn schema() -> &'static EntitySchema {
///         &USER_SCHEMA
///     }
///
///     fn from_row(row: &Row) -> DbResult<Self> {
///         Ok(Self {
///             id: row.get("id").and_then(|v| v.as_str()).map(String::from),
///             email: row.get("email").and_then(|v| v.as_str()).map(String::from),
///         })
///     }
///
///     fn value(&self, field: &str) -> Option<SqlValue> {
///         match field {
///             "id" => self.id.clone().map(SqlValue::from),
///             "email" => self.email.clone().map(SqlValue::from),
///             _ => None,
///         }
///     }
///
///     fn set_value(&mut self, field: &str, value: SqlValue) {
///         match (field, value) {
///             ("id", SqlValue::Text(v)) => self.id = Some(v),
///             ("email", SqlValue::Text(v)) => self.email = Some(v),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait Entity: Sized {
    /// The cached, immutable schema for this entity type.
    fn schema() -> &'static EntitySchema;

    /// Materialize an instance from a result row.
    fn from_row(row: &Row) -> DbResult<Self>;

    /// Current value of a field; `None` when unset.
    fn value(&self, field: &str) -> Option<SqlValue>;

    /// Write a resolved value back into the instance.
    fn set_value(&mut self, field: &str, value: SqlValue);
}

/// Generate a sortable 50-character id: a zero-padded millisecond timestamp
/// followed by a hex UUID and a `000` suffix.
pub fn next_id() -> SqlValue {
    SqlValue::Text(format!(
        "{:015}{}000",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    ))
}

/// Current Unix time in seconds, as a float.
pub fn unix_time() -> SqlValue {
    SqlValue::Float(chrono::Utc::now().timestamp_millis() as f64 / 1000.0)
}
