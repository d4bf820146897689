//! Ad-hoc read query composition.
//!
//! A [`Query`] carries the where/order/limit tail appended to an entity's
//! select template. Clause *shape* (column names, operators) is caller
//! string content; every value is a bound parameter.

use crate::value::SqlValue;

/// Row-limit shape: a plain count, or an (offset, count) pair.
///
/// The two variants are the only legal shapes; each renders its own
/// placeholder form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Count(u64),
    OffsetCount(u64, u64),
}

impl From<u64> for Limit {
    fn from(count: u64) -> Self {
        Self::Count(count)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Self::OffsetCount(offset, count)
    }
}

/// Criteria for a find-by-criteria read.
#[derive(Debug, Clone, Default)]
pub struct Query {
    where_clause: Option<String>,
    args: Vec<SqlValue>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict with a where clause; values referenced by `?` markers come
    /// from `args`.
    pub fn filter(mut self, clause: impl Into<String>, args: Vec<SqlValue>) -> Self {
        self.where_clause = Some(clause.into());
        self.args = args;
        self
    }

    /// Append an order-by clause, e.g. `"created_at desc"`.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    /// Cap the result. `5u64` renders ` limit ?`; `(20u64, 10u64)` renders
    /// ` limit ?, ?` bound as (offset, count) in that order.
    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Render `base` plus the tail clauses, returning the statement and its
    /// full bound-argument list.
    pub(crate) fn to_sql(&self, base: &str) -> (String, Vec<SqlValue>) {
        let mut sql = base.to_string();
        let mut args = self.args.clone();

        if let Some(clause) = &self.where_clause {
            sql.push_str(" where ");
            sql.push_str(clause);
        }
        if let Some(clause) = &self.order_by {
            sql.push_str(" order by ");
            sql.push_str(clause);
        }
        match self.limit {
            Some(Limit::Count(count)) => {
                sql.push_str(" limit ?");
                args.push(SqlValue::Int(count as i64));
            }
            Some(Limit::OffsetCount(offset, count)) => {
                sql.push_str(" limit ?, ?");
                args.push(SqlValue::Int(offset as i64));
                args.push(SqlValue::Int(count as i64));
            }
            None => {}
        }

        (sql, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    const BASE: &str = "select `id`, `name` from `users`";

    #[test]
    fn test_bare_query() {
        let (sql, args) = Query::new().to_sql(BASE);
        assert_eq!(sql, BASE);
        assert!(args.is_empty());
    }

    #[test]
    fn test_clause_order() {
        let (sql, args) = Query::new()
            .filter("`name`=?", params!["alice"])
            .order_by("`created_at` desc")
            .limit(5u64)
            .to_sql(BASE);
        assert_eq!(
            sql,
            "select `id`, `name` from `users` where `name`=? \
             order by `created_at` desc limit ?"
        );
        assert_eq!(args, params!["alice", 5]);
    }

    #[test]
    fn test_single_limit_one_placeholder() {
        let (sql, args) = Query::new().limit(5u64).to_sql(BASE);
        assert!(sql.ends_with(" limit ?"));
        assert_eq!(args, vec![SqlValue::Int(5)]);
    }

    #[test]
    fn test_offset_limit_two_placeholders_in_order() {
        let (sql, args) = Query::new().limit((20u64, 10u64)).to_sql(BASE);
        assert!(sql.ends_with(" limit ?, ?"));
        assert_eq!(args, vec![SqlValue::Int(20), SqlValue::Int(10)]);
    }

    #[test]
    fn test_filter_args_precede_limit_args() {
        let (_, args) = Query::new()
            .filter("`admin`=?", params![true])
            .limit((20u64, 10u64))
            .to_sql(BASE);
        assert_eq!(
            args,
            vec![SqlValue::Bool(true), SqlValue::Int(20), SqlValue::Int(10)]
        );
    }
}
