//! Query options for record access
//!
//! A plain options object with the four recognized keys: `select`,
//! `filter`, `order_by`, `limit`. Filters are an AND-set of equality
//! clauses; an array value means "IN".

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single filter clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// Field equals the value
    Eq(Value),
    /// Field equals any of the values; an empty list matches nothing
    In(Vec<Value>),
}

/// AND-combined set of field filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    clauses: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), FilterValue::Eq(value.into())));
        self
    }

    /// Add an IN clause
    pub fn any(mut self, field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.clauses.push((
            field.into(),
            FilterValue::In(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[(String, FilterValue)] {
        &self.clauses
    }

    /// Whether any IN clause is empty, i.e. the filter can match no row
    pub fn is_vacuous(&self) -> bool {
        self.clauses
            .iter()
            .any(|(_, v)| matches!(v, FilterValue::In(values) if values.is_empty()))
    }

    /// Evaluate the filter against a JSON row (used by the in-memory backend)
    pub fn matches(&self, row: &Value) -> bool {
        self.clauses.iter().all(|(field, clause)| {
            let actual = row.get(field).unwrap_or(&Value::Null);
            match clause {
                FilterValue::Eq(expected) => actual == expected,
                FilterValue::In(values) => values.iter().any(|v| v == actual),
            }
        })
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: true }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: false }
    }
}

/// Options for list queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Projection: comma-separated field list, `None` means all columns
    pub select: Option<String>,
    /// AND-combined field filters
    pub filter: Option<Filter>,
    /// Sort order
    pub order_by: Option<OrderBy>,
    /// Maximum number of rows
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, projection: impl Into<String>) -> Self {
        self.select = Some(projection.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter_matches() {
        let filter = Filter::new().eq("status", "active");
        assert!(filter.matches(&json!({"status": "active", "name": "a"})));
        assert!(!filter.matches(&json!({"status": "archived"})));
        assert!(!filter.matches(&json!({})));
    }

    #[test]
    fn test_in_filter_matches_any_listed_value() {
        let filter = Filter::new().any("stage", ["draft", "review"]);
        assert!(filter.matches(&json!({"stage": "draft"})));
        assert!(filter.matches(&json!({"stage": "review"})));
        assert!(!filter.matches(&json!({"stage": "done"})));
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let filter = Filter::new().any("stage", Vec::<String>::new());
        assert!(filter.is_vacuous());
        assert!(!filter.matches(&json!({"stage": "draft"})));
    }

    #[test]
    fn test_clauses_combine_with_and() {
        let filter = Filter::new().eq("status", "active").eq("owner", "u1");
        assert!(filter.matches(&json!({"status": "active", "owner": "u1"})));
        assert!(!filter.matches(&json!({"status": "active", "owner": "u2"})));
    }

    #[test]
    fn test_options_builder() {
        let options = QueryOptions::new()
            .select("id,name")
            .filter(Filter::new().eq("status", "active"))
            .order_by(OrderBy::desc("created_at"))
            .limit(20);
        assert_eq!(options.select.as_deref(), Some("id,name"));
        assert_eq!(options.limit, Some(20));
        assert!(!options.order_by.unwrap().ascending);
    }
}
