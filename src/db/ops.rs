//! Entity persistence and read operations.
//!
//! CRUD is layered on the schema templates and the statement executor. A
//! row-count mismatch on save/update/remove is logged at warning level and
//! not raised: the caller already holds the instance, and a mismatch most
//! often indicates a benign race (e.g. the row was already deleted) rather
//! than a usage error. Callers needing strict guarantees re-check by key
//! after the call.

use crate::db::pool::Database;
use crate::error::{DbError, DbResult};
use crate::page::Page;
use crate::query::Query;
use crate::schema::{Entity, FieldDefault, SchemaField, quote};
use crate::value::SqlValue;
use tracing::{debug, warn};

impl Database {
    /// Insert an entity. Unset fields resolve to their descriptor defaults
    /// (generators run once; the resolved value is written back into the
    /// instance). Values are bound in schema column order, primary key last.
    pub async fn save<E: Entity>(&self, entity: &mut E) -> DbResult<()> {
        let schema = E::schema();
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for field in schema.fields() {
            args.push(value_or_default(entity, field));
        }
        args.push(value_or_default(entity, schema.primary_key()));

        let rows = self.execute_mutation(schema.insert_sql(), &args).await?;
        if rows != 1 {
            warn!(
                entity = schema.entity(),
                affected = rows,
                "failed to insert record"
            );
        }
        Ok(())
    }

    /// Update an entity by primary key. Current values only - no default
    /// substitution; an unset field is written as NULL.
    pub async fn update<E: Entity>(&self, entity: &E) -> DbResult<()> {
        let schema = E::schema();
        let mut args: Vec<SqlValue> = schema
            .fields()
            .iter()
            .map(|field| entity.value(&field.name).unwrap_or(SqlValue::Null))
            .collect();
        args.push(
            entity
                .value(&schema.primary_key().name)
                .unwrap_or(SqlValue::Null),
        );

        let rows = self.execute_mutation(schema.update_sql(), &args).await?;
        if rows != 1 {
            warn!(
                entity = schema.entity(),
                affected = rows,
                "failed to update by primary key"
            );
        }
        Ok(())
    }

    /// Delete an entity by primary key.
    pub async fn remove<E: Entity>(&self, entity: &E) -> DbResult<()> {
        let schema = E::schema();
        let args = [entity
            .value(&schema.primary_key().name)
            .unwrap_or(SqlValue::Null)];

        let rows = self.execute_mutation(schema.delete_sql(), &args).await?;
        if rows != 1 {
            warn!(
                entity = schema.entity(),
                affected = rows,
                "failed to remove by primary key"
            );
        }
        Ok(())
    }

    /// Find entities by criteria.
    pub async fn find_all<E: Entity>(&self, query: Query) -> DbResult<Vec<E>> {
        let schema = E::schema();
        let (sql, args) = query.to_sql(schema.select_sql());
        let rows = self.execute_query(&sql, &args, None).await?;
        rows.iter().map(E::from_row).collect()
    }

    /// Find one entity by primary key; `None` when no row matches.
    pub async fn find_by_key<E: Entity>(&self, key: impl Into<SqlValue>) -> DbResult<Option<E>> {
        let schema = E::schema();
        let sql = format!(
            "{} where {}=?",
            schema.select_sql(),
            quote(&schema.primary_key().column)
        );
        let rows = self.execute_query(&sql, &[key.into()], Some(1)).await?;
        match rows.first() {
            Some(row) => Ok(Some(E::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Run an aggregate select against the entity's table and return the
    /// scalar, e.g. `count("count(id)", None, &[])`. `None` when the result
    /// has no rows or a NULL scalar.
    pub async fn count<E: Entity>(
        &self,
        select_expr: &str,
        where_clause: Option<&str>,
        args: &[SqlValue],
    ) -> DbResult<Option<i64>> {
        let schema = E::schema();
        let mut sql = format!(
            "select {} as `count` from {}",
            select_expr,
            quote(schema.table())
        );
        if let Some(clause) = where_clause {
            sql.push_str(" where ");
            sql.push_str(clause);
        }

        let rows = self.execute_query(&sql, args, Some(1)).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let value = row
            .get("count")
            .ok_or_else(|| DbError::decode("aggregate column 'count' missing from result"))?;
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(*v)),
            other => Err(DbError::decode(format!(
                "aggregate value is {}, expected int",
                other.type_name()
            ))),
        }
    }

    /// Pagination window for a list view, using the configured page size.
    pub fn page(&self, item_count: u64, page_index: u64) -> Page {
        Page::new(item_count, page_index, self.page_size())
    }
}

/// Current value of a field, falling back to the descriptor default. A
/// resolved default is written back into the instance, so the generator for
/// an unset field runs at most once per instance.
fn value_or_default<E: Entity>(entity: &mut E, field: &SchemaField) -> SqlValue {
    if let Some(value) = entity.value(&field.name) {
        return value;
    }
    match field.descriptor.default() {
        FieldDefault::Generator(generator) => {
            let value = generator();
            debug!(field = %field.name, "using generated default");
            entity.set_value(&field.name, value.clone());
            value
        }
        FieldDefault::Value(value) => {
            entity.set_value(&field.name, value.clone());
            value.clone()
        }
        FieldDefault::None => SqlValue::Null,
    }
}
