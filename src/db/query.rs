use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};

use super::Collection;

/// A single query predicate on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value.
    Eq(String, Value),
    /// String field equals the value, ignoring ASCII case.
    EqIgnoreCase(String, String),
    /// Array field contains the value.
    Contains(String, Value),
    /// Document was stored strictly after the instant.
    CreatedAfter(DateTime<Utc>),
}

/// Result ordering. Ties are broken by insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Order {
    #[default]
    NewestFirst,
    OldestFirst,
    FieldAsc(String),
    FieldDesc(String),
}

/// Filtered, ordered, limited read over one collection.
#[derive(Debug, Clone)]
pub struct Query {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order: Order,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: Order::default(),
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    /// Adds an equality filter only when a value is given.
    pub fn where_eq_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.where_eq(field, value),
            None => self,
        }
    }

    pub fn where_eq_ignore_case(mut self, field: impl Into<String>, value: &str) -> Self {
        self.filters
            .push(Filter::EqIgnoreCase(field.into(), value.to_string()));
        self
    }

    /// Adds a case-insensitive equality filter only when a value is given.
    pub fn where_eq_ignore_case_opt(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.where_eq_ignore_case(field, value),
            None => self,
        }
    }

    pub fn where_contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Contains(field.into(), value.into()));
        self
    }

    pub fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.filters.push(Filter::CreatedAfter(instant));
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Appends the WHERE clause for this query to `qb`.
    pub(crate) fn push_where<'a>(&self, qb: &mut QueryBuilder<'a, Sqlite>) {
        qb.push(" WHERE collection = ");
        qb.push_bind(self.collection.name());

        for filter in &self.filters {
            match filter {
                Filter::Eq(field, Value::Null) => {
                    qb.push(" AND json_extract(data, ");
                    qb.push_bind(json_path(field));
                    qb.push(") IS NULL");
                }
                Filter::Eq(field, value) => {
                    qb.push(" AND json_extract(data, ");
                    qb.push_bind(json_path(field));
                    qb.push(") = ");
                    push_value(qb, value);
                }
                Filter::EqIgnoreCase(field, value) => {
                    qb.push(" AND lower(json_extract(data, ");
                    qb.push_bind(json_path(field));
                    qb.push(")) = lower(");
                    qb.push_bind(value.clone());
                    qb.push(")");
                }
                Filter::Contains(field, value) => {
                    qb.push(" AND EXISTS (SELECT 1 FROM json_each(data, ");
                    qb.push_bind(json_path(field));
                    qb.push(") WHERE json_each.value = ");
                    push_value(qb, value);
                    qb.push(")");
                }
                Filter::CreatedAfter(instant) => {
                    qb.push(" AND created_at > ");
                    qb.push_bind(timestamp(instant));
                }
            }
        }
    }

    /// Appends ORDER BY and LIMIT for this query to `qb`.
    pub(crate) fn push_order_and_limit<'a>(&self, qb: &mut QueryBuilder<'a, Sqlite>) {
        match &self.order {
            Order::NewestFirst => {
                qb.push(" ORDER BY created_at DESC, rowid DESC");
            }
            Order::OldestFirst => {
                qb.push(" ORDER BY created_at ASC, rowid ASC");
            }
            Order::FieldAsc(field) => {
                qb.push(" ORDER BY json_extract(data, ");
                qb.push_bind(json_path(field));
                qb.push(") ASC, rowid ASC");
            }
            Order::FieldDesc(field) => {
                qb.push(" ORDER BY json_extract(data, ");
                qb.push_bind(json_path(field));
                qb.push(") DESC, rowid DESC");
            }
        }

        if let Some(limit) = self.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
    }
}

pub(crate) fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

/// Fixed-width UTC timestamp so stored values sort lexicographically.
pub(crate) fn timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Binds a JSON value the way SQLite's `json_extract` returns it.
pub(crate) fn push_value<'a>(qb: &mut QueryBuilder<'a, Sqlite>, value: &Value) {
    match value {
        Value::Bool(b) => {
            qb.push_bind(i64::from(*b));
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                qb.push_bind(i);
            }
            None => {
                qb.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        other => {
            qb.push_bind(other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select_sql(query: &Query) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT data FROM documents");
        query.push_where(&mut qb);
        query.push_order_and_limit(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_default_query_orders_newest_first() {
        let sql = select_sql(&Query::new(Collection::Posts));
        assert!(sql.contains("WHERE collection = ?"));
        assert!(sql.ends_with("ORDER BY created_at DESC, rowid DESC"));
    }

    #[test]
    fn test_filters_and_limit() {
        let query = Query::new(Collection::Marketplace)
            .where_eq("category", "books")
            .where_eq("sold", false)
            .where_contains("tags", "cheap")
            .order_by(Order::FieldAsc("price".into()))
            .limit(20);
        let sql = select_sql(&query);

        assert_eq!(sql.matches("json_extract(data, ?) = ?").count(), 2);
        assert!(sql.contains("json_each(data, ?)"));
        assert!(sql.contains("ORDER BY json_extract(data, ?) ASC"));
        assert!(sql.ends_with("LIMIT ?"));
    }

    #[test]
    fn test_null_filter_uses_is_null() {
        let query = Query::new(Collection::Events).where_eq("maxAttendees", Value::Null);
        assert!(select_sql(&query).contains("IS NULL"));
    }

    #[test]
    fn test_where_eq_opt_skips_none() {
        let query = Query::new(Collection::Posts).where_eq_opt::<&str>("category", None);
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_ignore_case_filter_lowers_both_sides() {
        let query = Query::new(Collection::Events).where_eq_ignore_case("category", "Cultural");
        assert!(select_sql(&query).contains("lower(json_extract(data, ?)) = lower(?)"));

        let query = Query::new(Collection::Events).where_eq_ignore_case_opt("category", None);
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_timestamp_is_fixed_width() {
        let a = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2025-01-01T00:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp(&a).len(), timestamp(&b).len());
        assert!(timestamp(&a) < timestamp(&b));
    }
}
