/// Task query engine
///
/// The layer between raw request parameters and the relational store:
/// access scope enforcement, the fixed filter vocabulary, deterministic
/// sorting with domain orderings, allow-listed relation inclusion, and
/// offset/cursor pagination.
///
/// All predicate building happens against one capability set,
/// [`TaskQuery`], regardless of whether the base is the caller's default
/// scope or an explicitly narrowed one — filters, sorting, and both
/// pagination modes compose onto the same builder.
///
/// # Flow
///
/// ```text
/// caller identity + raw params
///   → AccessScope (mandatory, applied first, never widenable)
///   → TaskFilters (AND-chained; invalid values resolve to absent)
///   → SortSpec (allow-listed columns, fixed domain orderings)
///   → paginate_tasks (offset window or keyset cursor)
///   → TaskInclude (eager-load allow-listed relations onto the page)
/// ```

pub mod filter;
pub mod include;
pub mod pagination;
pub mod scope;
pub mod sort;

use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use crate::models::task::TASK_COLUMNS;
use filter::TaskFilters;
use scope::AccessScope;
use sort::SortSpec;

/// Error type for query construction and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A cursor token that does not decode, or that was minted for a
    /// different sort than the one requested alongside it.
    #[error("Invalid pagination cursor")]
    InvalidCursor,
}

/// A filtered, scoped, sorted query over the tasks table
///
/// Soft-deleted rows are excluded unconditionally; the explicit
/// include-deleted read path goes through `Task::find_by_id_any` instead.
#[derive(Debug, Clone)]
pub struct TaskQuery {
    scope: AccessScope,
    filters: TaskFilters,
    sort: SortSpec,
}

impl TaskQuery {
    /// Creates a query restricted to the given scope, with no filters and
    /// the default ordering.
    pub fn new(scope: AccessScope) -> Self {
        Self {
            scope,
            filters: TaskFilters::default(),
            sort: SortSpec::default(),
        }
    }

    pub fn with_filters(mut self, filters: TaskFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Appends the scope predicate and every active filter to `qb`.
    ///
    /// The scope always lands first; filters AND-chain after it, so no
    /// caller-supplied parameter can widen what the scope admitted.
    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        self.scope.apply(qb);
        self.filters.apply(qb);
    }

    /// Builds the SELECT with all predicates applied, no ordering yet.
    pub(crate) fn select_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE deleted_at IS NULL"
        ));
        self.push_predicates(&mut qb);
        qb
    }

    /// Counts matching rows. Only length-aware pagination runs this;
    /// cursor mode never counts.
    pub async fn count(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tasks WHERE deleted_at IS NULL");
        self.push_predicates(&mut qb);

        let (count,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_scope_lands_before_filters() {
        let caller = Uuid::new_v4();
        let query = TaskQuery::new(AccessScope::Owner(caller));

        let mut qb = QueryBuilder::new("SELECT 1 FROM tasks WHERE deleted_at IS NULL");
        query.push_predicates(&mut qb);

        assert!(qb.sql().contains("assigned_to = "));
    }

    #[test]
    fn test_select_excludes_soft_deleted() {
        let query = TaskQuery::new(AccessScope::admin());
        let qb = query.select_builder();
        assert!(qb.sql().contains("deleted_at IS NULL"));
    }
}
