/// Ordering vocabulary for task listings
///
/// Callers pick columns by name (`sort=priority,due_date`) and a single
/// direction (`sort-type=asc`); everything else about the ORDER BY clause is
/// fixed here. Two columns need rewriting before they sort usefully:
///
/// - `status` and `priority` order by workflow rank, not by the alphabetical
///   accident of their labels, via a CASE expression.
/// - `due_date` coalesces NULL to a sentinel far in the past so undated
///   tasks group together deterministically instead of floating per the
///   database's NULL ordering.
///
/// Every ordering ends with an `id` tie-break, which also makes the sort a
/// total order — a requirement for cursor pagination to resume without
/// skipping or repeating rows.

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

/// Timestamp every NULL due date collapses to when sorting or building
/// cursor keys. Keeping the same sentinel in both places is what lets a
/// cursor row comparison agree with the ORDER BY it resumes.
pub const DUE_DATE_SENTINEL_SQL: &str = "COALESCE(due_date, TIMESTAMPTZ '0001-01-01 00:00:00+00')";

/// Seconds-since-epoch form of the sentinel above (0001-01-01T00:00:00Z).
pub const DUE_DATE_SENTINEL_SECS: i64 = -62_135_596_800;

/// A sortable column, by its external name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    CreatedAt,
    DueDate,
    Priority,
    Title,
    Status,
}

impl SortColumn {
    /// Resolves an external column name, `None` for anything outside the
    /// sortable vocabulary.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(Self::CreatedAt),
            "due_date" => Some(Self::DueDate),
            "priority" => Some(Self::Priority),
            "title" => Some(Self::Title),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    /// The SQL expression this column orders by.
    pub fn sql_expr(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::DueDate => DUE_DATE_SENTINEL_SQL,
            Self::Priority => {
                "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 WHEN 'high' THEN 2 END"
            }
            Self::Title => "title",
            Self::Status => {
                "CASE status WHEN 'pending' THEN 0 WHEN 'in_progress' THEN 1 WHEN 'completed' THEN 2 END"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Anything other than a literal `asc` sorts descending.
    pub fn from_param(value: &str) -> Self {
        if value == "asc" {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A complete ordering: one or more columns, one shared direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub columns: Vec<SortColumn>,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        Self {
            columns: vec![SortColumn::CreatedAt],
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Parses `sort` (comma-separated column names) and `sort-type`.
    /// Unknown column names drop out; if nothing survives, the default
    /// ordering applies.
    pub fn from_params(sort: Option<&str>, sort_type: Option<&str>) -> Self {
        let columns: Vec<SortColumn> = sort
            .unwrap_or("")
            .split(',')
            .filter_map(|token| SortColumn::from_param(token.trim()))
            .collect();

        let direction = sort_type
            .map(|v| SortDirection::from_param(v.trim()))
            .unwrap_or_default();

        if columns.is_empty() {
            Self {
                direction,
                ..Self::default()
            }
        } else {
            Self { columns, direction }
        }
    }

    /// Appends the full ORDER BY clause, `id` tie-break included.
    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" ORDER BY ");
        for column in &self.columns {
            qb.push(column.sql_expr());
            qb.push(" ");
            qb.push(self.direction.as_sql());
            qb.push(", ");
        }
        qb.push("id ");
        qb.push(self.direction.as_sql());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_by(spec: &SortSpec) -> String {
        let mut qb = QueryBuilder::new("SELECT 1 FROM tasks");
        spec.push_order_by(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_default_is_created_at_desc() {
        let spec = SortSpec::default();
        assert_eq!(
            order_by(&spec),
            "SELECT 1 FROM tasks ORDER BY created_at DESC, id DESC"
        );
    }

    #[test]
    fn test_unknown_columns_drop_out() {
        let spec = SortSpec::from_params(Some("updated_at,priority"), None);
        assert_eq!(spec.columns, vec![SortColumn::Priority]);
    }

    #[test]
    fn test_all_unknown_falls_back_to_default_columns() {
        let spec = SortSpec::from_params(Some("updated_at"), Some("asc"));
        assert_eq!(spec.columns, vec![SortColumn::CreatedAt]);
        assert_eq!(spec.direction, SortDirection::Asc);
    }

    #[test]
    fn test_direction_defaults_to_desc() {
        assert_eq!(SortDirection::from_param("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::from_param("ascending"), SortDirection::Desc);
        assert_eq!(SortDirection::from_param(""), SortDirection::Desc);
    }

    #[test]
    fn test_priority_orders_by_rank_not_label() {
        let spec = SortSpec::from_params(Some("priority"), Some("asc"));
        let sql = order_by(&spec);
        assert!(sql.contains("CASE priority WHEN 'low' THEN 0"));
        assert!(sql.ends_with("ASC, id ASC"));
    }

    #[test]
    fn test_due_date_nulls_collapse_to_sentinel() {
        let spec = SortSpec::from_params(Some("due_date"), None);
        assert!(order_by(&spec).contains(DUE_DATE_SENTINEL_SQL));
    }

    #[test]
    fn test_multi_column_preserves_order() {
        let spec = SortSpec::from_params(Some("status, title"), Some("asc"));
        assert_eq!(spec.columns, vec![SortColumn::Status, SortColumn::Title]);
        let sql = order_by(&spec);
        let status_pos = sql.find("CASE status").unwrap();
        let title_pos = sql.find("title ASC").unwrap();
        assert!(status_pos < title_pos);
    }
}
