/// Tag model and task-tag association operations
///
/// Tags have a lifecycle independent of tasks. The many-to-many join rows
/// in `task_tag` carry their own timestamps, distinct from the task's, and
/// detaching a tag never touches the task's version counter.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     color VARCHAR(32) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_tag (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, tag_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Tag row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or renaming a tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagFields {
    pub name: String,
    pub color: String,
}

impl Tag {
    /// Creates a tag. A duplicate name violates the unique constraint and
    /// surfaces as a database error the API layer maps to a conflict.
    pub async fn create(pool: &PgPool, fields: TagFields) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, color)
            VALUES ($1, $2)
            RETURNING id, name, color, created_at, updated_at
            "#,
        )
        .bind(fields.name)
        .bind(fields.color)
        .fetch_one(pool)
        .await
    }

    /// Finds a tag by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, name, color, created_at, updated_at FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates name and color.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        fields: TagFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
            SET name = $2, color = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, color, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.color)
        .fetch_optional(pool)
        .await
    }

    /// Hard-deletes a tag; join rows go with it via CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the subset of `ids` that does not exist in the tags table.
    ///
    /// Request validation uses this to reject references to unknown tags
    /// before any mutation happens.
    pub async fn missing_from(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let existing: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(pool)
            .await?;

        let found: Vec<Uuid> = existing.into_iter().map(|(id,)| id).collect();
        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    /// Attaches tags to a freshly created task.
    pub async fn attach_to_task(
        pool: &PgPool,
        task_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO task_tag (task_id, tag_id)
            SELECT $1, unnested FROM UNNEST($2::uuid[]) AS unnested
            ON CONFLICT (task_id, tag_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(tag_ids.to_vec())
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Replaces a task's association set with `tag_ids`.
    ///
    /// Runs after (and outside) the task's version-guarded write, so two
    /// concurrent syncs against the same task can interleave; the last
    /// writer's set wins per join row. That window is inherited behavior,
    /// not a guarantee callers may rely on.
    pub async fn sync_for_task(
        pool: &PgPool,
        task_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_tag WHERE task_id = $1 AND tag_id != ALL($2)")
            .bind(task_id)
            .bind(tag_ids.to_vec())
            .execute(pool)
            .await?;

        Self::attach_to_task(pool, task_id, tag_ids).await
    }

    /// Batch-loads tags for a set of tasks, keyed by task id.
    pub async fn for_tasks(
        pool: &PgPool,
        task_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Tag>>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, Tag)> = sqlx::query_as::<_, TaskTagRow>(
            r#"
            SELECT task_tag.task_id, tags.id, tags.name, tags.color, tags.created_at, tags.updated_at
            FROM task_tag
            JOIN tags ON tags.id = task_tag.tag_id
            WHERE task_tag.task_id = ANY($1)
            ORDER BY tags.name
            "#,
        )
        .bind(task_ids.to_vec())
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| (row.task_id, row.tag))
        .collect();

        let mut by_task: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (task_id, tag) in rows {
            by_task.entry(task_id).or_default().push(tag);
        }

        Ok(by_task)
    }
}

/// Join row for the batch load, tag columns flattened.
#[derive(Debug, sqlx::FromRow)]
struct TaskTagRow {
    task_id: Uuid,
    #[sqlx(flatten)]
    tag: Tag,
}
