/// Task model and database operations
///
/// Tasks are the core entity of Taskforge. Concurrent writers are
/// serialized through a per-row `version` counter: every successful update
/// is a single conditional UPDATE that matches `(id, version)` and bumps
/// the counter by one. There is no read-then-write anywhere in this module.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     version BIGINT NOT NULL DEFAULT 1,
///     metadata JSONB,
///     due_date TIMESTAMPTZ,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskforge_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Write release notes".to_string(),
///     description: None,
///     status: TaskStatus::Pending,
///     priority: TaskPriority::High,
///     metadata: None,
///     due_date: None,
///     assigned_to: None,
/// }).await?;
/// assert_eq!(task.version, 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Columns returned by every task query, in `FromRow` order.
pub const TASK_COLUMNS: &str = "id, title, description, status, priority, version, metadata, \
     due_date, assigned_to, deleted_at, created_at, updated_at";

/// Task workflow status
///
/// The three statuses form a fixed cycle used by the toggle operation:
/// pending → in_progress → completed → pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses a query-parameter value; unknown values resolve to `None`
    /// rather than an error so listing endpoints stay tolerant of
    /// malformed query strings.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    /// Position in the fixed domain ordering (pending < in_progress < completed).
    ///
    /// Sorting by status uses this rank, never the lexical value.
    pub fn rank(&self) -> i32 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Completed => 2,
        }
    }

    /// Next status in the cycle, wrapping completed back to pending.
    pub fn next(&self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// See [`TaskStatus::from_param`].
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }

    /// Position in the fixed domain ordering (low < medium < high).
    pub fn rank(&self) -> i32 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Medium => 1,
            TaskPriority::High => 2,
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short human-readable title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optimistic-concurrency counter; starts at 1, +1 on every applied update
    pub version: i64,

    /// Semi-structured metadata document
    pub metadata: Option<JsonValue>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Owner (nullable if unassigned or the user was deleted)
    pub assigned_to: Option<Uuid>,

    /// Soft-delete marker; set rows are hidden from default reads
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// True if the task is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub metadata: Option<JsonValue>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

/// Full replacement field set for a version-guarded update
///
/// Updates always carry the complete mutable field set; partial patches do
/// not exist at this layer. Tag associations are synced separately and are
/// not covered by the version guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskChanges {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub metadata: Option<JsonValue>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

impl Task {
    /// Creates a new task with `version = 1`.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, metadata, due_date, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.metadata)
        .bind(data.due_date)
        .bind(data.assigned_to)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, excluding soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a task by ID including soft-deleted rows.
    ///
    /// Used by restore and by any explicit "include deleted" read path.
    pub async fn find_by_id_any(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Version-guarded field update.
    ///
    /// A single conditional write: the row is updated only when both the id
    /// and the current version match, and the version is incremented in the
    /// same statement. `Ok(None)` means zero rows matched — the version has
    /// advanced since the caller read it (or the row was soft-deleted in
    /// the meantime) and the caller should surface a retryable conflict.
    pub async fn update_guarded(
        pool: &PgPool,
        id: Uuid,
        expected_version: i64,
        changes: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $3,
                description = $4,
                status = $5,
                priority = $6,
                metadata = $7,
                due_date = $8,
                assigned_to = $9,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(expected_version)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status)
        .bind(changes.priority)
        .bind(changes.metadata)
        .bind(changes.due_date)
        .bind(changes.assigned_to)
        .fetch_optional(pool)
        .await
    }

    /// Version-guarded status change, used by the toggle endpoint.
    ///
    /// Same conditional-write contract as [`Task::update_guarded`], but
    /// touching only the status column.
    pub async fn set_status_guarded(
        pool: &PgPool,
        id: Uuid,
        expected_version: i64,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $3,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(expected_version)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Soft-deletes a task. Returns false if it was already deleted or absent.
    ///
    /// Deletion does not touch the version counter; the soft-delete marker
    /// is owned by the task row itself.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears the soft-delete marker. Restoring a live task is a no-op that
    /// returns the row unchanged.
    pub async fn restore(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET deleted_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_status_from_param() {
        assert_eq!(TaskStatus::from_param("pending"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::from_param("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_param("completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::from_param("done"), None);
        assert_eq!(TaskStatus::from_param(""), None);
        // case-sensitive, like the original enum check
        assert_eq!(TaskStatus::from_param("Pending"), None);
    }

    #[test]
    fn test_status_cycle() {
        assert_eq!(TaskStatus::Pending.next(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::InProgress.next(), TaskStatus::Completed);
        // completed wraps back to pending
        assert_eq!(TaskStatus::Completed.next(), TaskStatus::Pending);
    }

    #[test]
    fn test_status_rank_order() {
        assert!(TaskStatus::Pending.rank() < TaskStatus::InProgress.rank());
        assert!(TaskStatus::InProgress.rank() < TaskStatus::Completed.rank());
    }

    #[test]
    fn test_priority_rank_order() {
        // low < medium < high, regardless of alphabetical order
        assert!(TaskPriority::Low.rank() < TaskPriority::Medium.rank());
        assert!(TaskPriority::Medium.rank() < TaskPriority::High.rank());
    }

    #[test]
    fn test_priority_from_param() {
        assert_eq!(TaskPriority::from_param("high"), Some(TaskPriority::High));
        assert_eq!(TaskPriority::from_param("urgent"), None);
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }
}
