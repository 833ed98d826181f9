/// Query filter builder
///
/// Parses the loosely-typed filter map into a strongly-typed request at the
/// boundary, then renders it as AND-chained predicates. The vocabulary is
/// fixed and closed; unrecognized keys are never looked at, and values that
/// fail to parse (unknown enum value, bad date) resolve to "absent" so
/// listing endpoints stay resilient to malformed query strings.
///
/// | key             | effect                                              |
/// |-----------------|-----------------------------------------------------|
/// | `search`        | title contains X OR description contains X          |
/// | `full-search`   | natural-language match on the title+description index|
/// | `status`        | exact status match                                  |
/// | `priority`      | exact priority match                                |
/// | `tags`          | associated with ANY of the listed tag ids           |
/// | `due-date-from` | inclusive lower bound, day granularity              |
/// | `due-date-to`   | inclusive upper bound, day granularity              |
///
/// `assigned-to` is scope, not a filter — see [`crate::query::scope`].

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::task::{TaskPriority, TaskStatus};

/// Strongly-typed filter request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilters {
    pub search: Option<String>,
    pub full_search: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Existential match: a task qualifies when it carries ANY listed tag.
    /// `Some(vec![])` means the caller supplied ids that all failed to
    /// parse — that matches nothing, as unknown ids would have.
    pub tags: Option<Vec<Uuid>>,
    pub due_date_from: Option<NaiveDate>,
    pub due_date_to: Option<NaiveDate>,
}

/// Trimmed, non-empty parameter lookup. Absence and emptiness both mean
/// "no constraint".
fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl TaskFilters {
    /// Parses the recognized filter keys from a raw parameter map.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            search: non_empty(params, "search").map(str::to_string),
            full_search: non_empty(params, "full-search").map(str::to_string),
            status: non_empty(params, "status").and_then(TaskStatus::from_param),
            priority: non_empty(params, "priority").and_then(TaskPriority::from_param),
            tags: non_empty(params, "tags").map(|v| {
                v.split(',')
                    .filter_map(|token| token.trim().parse::<Uuid>().ok())
                    .collect()
            }),
            due_date_from: non_empty(params, "due-date-from").and_then(|v| v.parse().ok()),
            due_date_to: non_empty(params, "due-date-to").and_then(|v| v.parse().ok()),
        }
    }

    /// Appends one predicate per active filter.
    ///
    /// The keyword search is a single OR-group nested inside the AND chain,
    /// so other filters cannot defeat it.
    pub fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(term) = &self.search {
            let pattern = format!("%{term}%");
            qb.push(" AND (title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if let Some(term) = &self.full_search {
            qb.push(
                " AND to_tsvector('english', title || ' ' || COALESCE(description, '')) \
                 @@ plainto_tsquery('english', ",
            );
            qb.push_bind(term.clone());
            qb.push(")");
        }

        if let Some(status) = self.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }

        if let Some(priority) = self.priority {
            qb.push(" AND priority = ");
            qb.push_bind(priority);
        }

        if let Some(tag_ids) = &self.tags {
            qb.push(
                " AND EXISTS (SELECT 1 FROM task_tag \
                 WHERE task_tag.task_id = tasks.id AND task_tag.tag_id = ANY(",
            );
            qb.push_bind(tag_ids.clone());
            qb.push("))");
        }

        if let Some(from) = self.due_date_from {
            qb.push(" AND due_date::date >= ");
            qb.push_bind(from);
        }

        if let Some(to) = self.due_date_to {
            qb.push(" AND due_date::date <= ");
            qb.push_bind(to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sql_for(filters: &TaskFilters) -> String {
        let mut qb = QueryBuilder::new("SELECT 1 FROM tasks WHERE deleted_at IS NULL");
        filters.apply(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_empty_params_mean_no_constraints() {
        let filters = TaskFilters::from_params(&params(&[]));
        assert_eq!(filters, TaskFilters::default());
        assert_eq!(
            sql_for(&filters),
            "SELECT 1 FROM tasks WHERE deleted_at IS NULL"
        );
    }

    #[test]
    fn test_values_are_trimmed() {
        let filters = TaskFilters::from_params(&params(&[("status", "  pending  ")]));
        assert_eq!(filters.status, Some(TaskStatus::Pending));
    }

    #[test]
    fn test_invalid_status_is_same_as_absent() {
        let invalid = TaskFilters::from_params(&params(&[("status", "archived")]));
        let absent = TaskFilters::from_params(&params(&[]));
        assert_eq!(invalid, absent);
    }

    #[test]
    fn test_invalid_priority_is_ignored() {
        let filters = TaskFilters::from_params(&params(&[("priority", "urgent")]));
        assert_eq!(filters.priority, None);
    }

    #[test]
    fn test_empty_value_is_no_op() {
        let filters = TaskFilters::from_params(&params(&[("full-search", "   ")]));
        assert_eq!(filters.full_search, None);
    }

    #[test]
    fn test_unrecognized_keys_are_ignored() {
        let filters = TaskFilters::from_params(&params(&[("colour", "red"), ("status", "pending")]));
        assert_eq!(filters.status, Some(TaskStatus::Pending));
        assert_eq!(sql_for(&filters).matches(" AND ").count(), 1);
    }

    #[test]
    fn test_search_is_a_nested_or_group() {
        let filters = TaskFilters::from_params(&params(&[("search", "invoices"), ("status", "pending")]));
        let sql = sql_for(&filters);
        assert!(sql.contains(" AND (title ILIKE $1 OR description ILIKE $2)"));
        assert!(sql.contains(" AND status = $3"));
    }

    #[test]
    fn test_tags_parse_as_id_set() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let filters = TaskFilters::from_params(&params(&[("tags", &format!("{a}, {b}"))]));
        assert_eq!(filters.tags, Some(vec![a, b]));

        let sql = sql_for(&filters);
        assert!(sql.contains("EXISTS (SELECT 1 FROM task_tag"));
        assert!(sql.contains("= ANY($1)"));
    }

    #[test]
    fn test_unparseable_tag_ids_match_nothing() {
        let filters = TaskFilters::from_params(&params(&[("tags", "first,second")]));
        // present-but-garbage constrains to the empty set, it does not
        // silently widen to "all tasks"
        assert_eq!(filters.tags, Some(vec![]));
    }

    #[test]
    fn test_due_date_bounds_are_day_granular() {
        let filters = TaskFilters::from_params(&params(&[
            ("due-date-from", "2025-01-10"),
            ("due-date-to", "2025-02-01"),
        ]));
        assert_eq!(
            filters.due_date_from,
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        let sql = sql_for(&filters);
        assert!(sql.contains("due_date::date >= $1"));
        assert!(sql.contains("due_date::date <= $2"));
    }

    #[test]
    fn test_bad_due_date_is_ignored() {
        let filters = TaskFilters::from_params(&params(&[("due-date-from", "next tuesday")]));
        assert_eq!(filters.due_date_from, None);
    }

    #[test]
    fn test_full_search_uses_text_index() {
        let filters = TaskFilters::from_params(&params(&[("full-search", "quarterly report")]));
        let sql = sql_for(&filters);
        assert!(sql.contains("to_tsvector"));
        assert!(sql.contains("plainto_tsquery"));
    }
}
