/// Dual-mode pagination over task queries
///
/// Two windowing strategies behind one entry point, [`paginate_tasks`]:
///
/// - **Length-aware** (`page=N`): classic COUNT + LIMIT/OFFSET with page
///   arithmetic in the envelope. Costs a count per request and drifts under
///   concurrent writes, but gives callers a page total.
/// - **Cursor** (`pagination-type=cursor`): keyset continuation encoded as
///   an opaque token. No count, stable under writes, O(log n) resume via a
///   row-value comparison against the active ordering's sort keys.
///
/// A cursor token remembers the ordering it was minted under; replaying it
/// against a different `sort`/`sort-type` is rejected rather than silently
/// producing a window that skips or repeats rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::task::Task;
use super::sort::{SortColumn, SortDirection, SortSpec, DUE_DATE_SENTINEL_SECS};
use super::{QueryError, TaskQuery};

/// Window size when the caller does not name one, or names an invalid one.
pub const DEFAULT_PER_PAGE: i64 = 15;

/// Hard ceiling on the window size. Keeps a single request from dragging
/// the whole table through the wire and keeps the `LIMIT per_page + 1`
/// and offset arithmetic inside i64 range.
pub const MAX_PER_PAGE: i64 = 100;

/// How a request wants its window addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationMode {
    LengthAware { page: i64 },
    Cursor { cursor: Option<String> },
}

/// Parsed pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub per_page: i64,
    pub mode: PaginationMode,
}

impl PageRequest {
    /// Parses `per-page`, `pagination-type`, `page`, and `cursor`.
    ///
    /// Non-numeric or non-positive sizes fall back to the default rather
    /// than erroring; oversized ones clamp to [`MAX_PER_PAGE`] and page
    /// numbers below 1 clamp to 1.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let per_page = params
            .get("per-page")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map(|n| n.min(MAX_PER_PAGE))
            .unwrap_or(DEFAULT_PER_PAGE);

        let mode = if params
            .get("pagination-type")
            .map(|v| v.trim() == "cursor")
            .unwrap_or(false)
        {
            PaginationMode::Cursor {
                cursor: params
                    .get("cursor")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            }
        } else {
            let page = params
                .get("page")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(1)
                .max(1);
            PaginationMode::LengthAware { page }
        };

        Self { per_page, mode }
    }
}

/// A length-aware page envelope.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

impl<T> OffsetPage<T> {
    pub fn with_data<U>(self, f: impl FnMut(T) -> U) -> OffsetPage<U> {
        OffsetPage {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

/// A cursor page envelope. No totals: counting is the thing cursor mode
/// exists to avoid.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub data: Vec<T>,
    pub per_page: i64,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> CursorPage<T> {
    pub fn with_data<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            data: self.data.into_iter().map(f).collect(),
            per_page: self.per_page,
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }
}

fn last_page_for(total: i64, per_page: i64) -> i64 {
    ((total + per_page - 1) / per_page).max(1)
}

/// One sort key captured from the boundary row of a page.
///
/// Tagged so a token survives serialization without ambiguity between a
/// timestamp and a rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
enum CursorKey {
    Time(DateTime<Utc>),
    Text(String),
    Rank(i32),
}

/// The decoded form of a cursor token: the ordering it was minted under
/// plus the sort-key values of the last row the caller has seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Cursor {
    direction: SortDirection,
    keys: Vec<(SortColumn, CursorKey)>,
    id: Uuid,
}

impl Cursor {
    /// Captures the boundary row's sort keys under the given spec.
    fn from_task(task: &Task, sort: &SortSpec) -> Self {
        let sentinel = DateTime::from_timestamp(DUE_DATE_SENTINEL_SECS, 0)
            .unwrap_or_default();
        let keys = sort
            .columns
            .iter()
            .map(|column| {
                let key = match column {
                    SortColumn::CreatedAt => CursorKey::Time(task.created_at),
                    SortColumn::DueDate => CursorKey::Time(task.due_date.unwrap_or(sentinel)),
                    SortColumn::Title => CursorKey::Text(task.title.clone()),
                    SortColumn::Priority => CursorKey::Rank(task.priority.rank()),
                    SortColumn::Status => CursorKey::Rank(task.status.rank()),
                };
                (*column, key)
            })
            .collect();
        Self {
            direction: sort.direction,
            keys,
            id: task.id,
        }
    }

    /// Whether this cursor was minted under the given ordering.
    fn matches_sort(&self, sort: &SortSpec) -> bool {
        self.direction == sort.direction
            && self.keys.len() == sort.columns.len()
            && self
                .keys
                .iter()
                .zip(&sort.columns)
                .all(|((column, _), expected)| column == expected)
    }

    fn encode(&self) -> String {
        // serializing an in-memory struct of plain fields cannot fail
        hex::encode(serde_json::to_vec(self).unwrap_or_default())
    }

    fn decode(token: &str) -> Result<Self, QueryError> {
        let bytes = hex::decode(token).map_err(|_| QueryError::InvalidCursor)?;
        serde_json::from_slice(&bytes).map_err(|_| QueryError::InvalidCursor)
    }

    /// Appends the keyset continuation predicate:
    /// `AND (expr1, expr2, ..., id) > (key1, key2, ..., last_id)`
    /// with `<` for descending orderings. Row-value comparison keeps the
    /// resume point consistent with a multi-column ORDER BY without
    /// expanding into the OR-chain form.
    fn push_predicate(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (");
        for (column, _) in &self.keys {
            qb.push(column.sql_expr());
            qb.push(", ");
        }
        qb.push("id) ");
        qb.push(match self.direction {
            SortDirection::Asc => "> (",
            SortDirection::Desc => "< (",
        });
        for (_, key) in &self.keys {
            match key {
                CursorKey::Time(t) => qb.push_bind(*t),
                CursorKey::Text(s) => qb.push_bind(s.clone()),
                CursorKey::Rank(r) => qb.push_bind(*r),
            };
            qb.push(", ");
        }
        qb.push_bind(self.id);
        qb.push(")");
    }
}

/// A page of tasks in whichever envelope the request chose.
#[derive(Debug, Clone)]
pub enum TaskPage {
    Offset(OffsetPage<Task>),
    Cursor(CursorPage<Task>),
}

/// Runs the query under the requested pagination mode.
pub async fn paginate_tasks(
    pool: &PgPool,
    query: &TaskQuery,
    request: &PageRequest,
) -> Result<TaskPage, QueryError> {
    match &request.mode {
        PaginationMode::LengthAware { page } => {
            let total = query.count(pool).await?;

            let mut qb = query.select_builder();
            query.sort().push_order_by(&mut qb);
            qb.push(" LIMIT ");
            qb.push_bind(request.per_page);
            qb.push(" OFFSET ");
            // page itself is unclamped caller input
            qb.push_bind((page - 1).saturating_mul(request.per_page));

            let data: Vec<Task> = qb.build_query_as().fetch_all(pool).await?;

            Ok(TaskPage::Offset(OffsetPage {
                data,
                current_page: *page,
                per_page: request.per_page,
                total,
                last_page: last_page_for(total, request.per_page),
            }))
        }
        PaginationMode::Cursor { cursor } => {
            let mut qb = query.select_builder();

            if let Some(token) = cursor {
                let decoded = Cursor::decode(token)?;
                if !decoded.matches_sort(query.sort()) {
                    return Err(QueryError::InvalidCursor);
                }
                decoded.push_predicate(&mut qb);
            }

            query.sort().push_order_by(&mut qb);
            qb.push(" LIMIT ");
            // one extra row decides has_more without a count
            qb.push_bind(request.per_page + 1);

            let mut data: Vec<Task> = qb.build_query_as().fetch_all(pool).await?;

            let has_more = data.len() as i64 > request.per_page;
            data.truncate(request.per_page as usize);

            let next_cursor = if has_more {
                data.last()
                    .map(|last| Cursor::from_task(last, query.sort()).encode())
            } else {
                None
            };

            Ok(TaskPage::Cursor(CursorPage {
                data,
                per_page: request.per_page,
                next_cursor,
                has_more,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Ship release notes".to_string(),
            description: None,
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            version: 3,
            metadata: None,
            due_date: None,
            assigned_to: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_defaults_to_length_aware_page_one() {
        let request = PageRequest::from_params(&params(&[]));
        assert_eq!(request.per_page, DEFAULT_PER_PAGE);
        assert_eq!(request.mode, PaginationMode::LengthAware { page: 1 });
    }

    #[test]
    fn test_invalid_per_page_falls_back() {
        for value in ["0", "-3", "ten", ""] {
            let request = PageRequest::from_params(&params(&[("per-page", value)]));
            assert_eq!(request.per_page, DEFAULT_PER_PAGE, "per-page={value:?}");
        }
    }

    #[test]
    fn test_oversized_per_page_clamps_to_ceiling() {
        for value in ["101", "100000", "9223372036854775807"] {
            let request = PageRequest::from_params(&params(&[("per-page", value)]));
            assert_eq!(request.per_page, MAX_PER_PAGE, "per-page={value:?}");
        }

        let request = PageRequest::from_params(&params(&[("per-page", "100")]));
        assert_eq!(request.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_extreme_page_offset_saturates() {
        let request = PageRequest::from_params(&params(&[
            ("page", "9223372036854775807"),
            ("per-page", "100"),
        ]));
        let PaginationMode::LengthAware { page } = request.mode else {
            panic!("expected length-aware mode");
        };
        let offset = (page - 1).saturating_mul(request.per_page);
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn test_page_below_one_clamps() {
        let request = PageRequest::from_params(&params(&[("page", "0")]));
        assert_eq!(request.mode, PaginationMode::LengthAware { page: 1 });
    }

    #[test]
    fn test_cursor_mode_requires_exact_keyword() {
        let request = PageRequest::from_params(&params(&[("pagination-type", "cursor")]));
        assert_eq!(request.mode, PaginationMode::Cursor { cursor: None });

        let request = PageRequest::from_params(&params(&[("pagination-type", "keyset")]));
        assert!(matches!(request.mode, PaginationMode::LengthAware { .. }));
    }

    #[test]
    fn test_last_page_arithmetic() {
        assert_eq!(last_page_for(0, 15), 1);
        assert_eq!(last_page_for(15, 15), 1);
        assert_eq!(last_page_for(16, 15), 2);
        assert_eq!(last_page_for(45, 15), 3);
    }

    #[test]
    fn test_cursor_round_trips() {
        let task = sample_task();
        let sort = SortSpec::default();
        let cursor = Cursor::from_task(&task, &sort);

        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
        assert_eq!(decoded.id, task.id);
    }

    #[test]
    fn test_garbage_tokens_are_rejected() {
        assert!(matches!(
            Cursor::decode("not hex at all"),
            Err(QueryError::InvalidCursor)
        ));
        // valid hex, not a cursor payload
        assert!(matches!(
            Cursor::decode(&hex::encode(b"[1,2,3]")),
            Err(QueryError::InvalidCursor)
        ));
    }

    #[test]
    fn test_cursor_is_bound_to_its_sort() {
        let task = sample_task();
        let minted_under = SortSpec::from_params(Some("priority"), Some("asc"));
        let cursor = Cursor::from_task(&task, &minted_under);

        assert!(cursor.matches_sort(&minted_under));
        assert!(!cursor.matches_sort(&SortSpec::default()));
        assert!(!cursor.matches_sort(&SortSpec::from_params(
            Some("priority"),
            Some("desc")
        )));
    }

    #[test]
    fn test_null_due_date_keys_on_sentinel() {
        let task = sample_task();
        let sort = SortSpec::from_params(Some("due_date"), None);
        let cursor = Cursor::from_task(&task, &sort);

        let (_, key) = &cursor.keys[0];
        let sentinel = DateTime::from_timestamp(DUE_DATE_SENTINEL_SECS, 0).unwrap();
        assert_eq!(key, &CursorKey::Time(sentinel));
    }

    #[test]
    fn test_predicate_is_row_value_comparison() {
        let task = sample_task();
        let sort = SortSpec::from_params(Some("priority,title"), Some("asc"));
        let cursor = Cursor::from_task(&task, &sort);

        let mut qb = QueryBuilder::new("SELECT 1 FROM tasks WHERE deleted_at IS NULL");
        cursor.push_predicate(&mut qb);
        let sql = qb.sql();

        assert!(sql.contains("id) > ($1, $2, $3)"), "sql: {sql}");

        let mut qb = QueryBuilder::new("SELECT 1 FROM tasks WHERE deleted_at IS NULL");
        let descending = Cursor {
            direction: SortDirection::Desc,
            ..cursor
        };
        descending.push_predicate(&mut qb);
        assert!(qb.sql().contains("id) < ($1, $2, $3)"));
    }
}
