/// Audit log model
///
/// Append-only record of every mutating action. Entries are denormalized:
/// they carry the acting user's id, the entity's kind and id, and a
/// serialized snapshot captured when the mutation happened — never
/// references to live rows. Nothing in this layer updates or deletes them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE audit_operation AS ENUM ('created', 'updated', 'deleted', 'restored');
///
/// CREATE TABLE audit_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL,
///     entity_type VARCHAR(64) NOT NULL,
///     entity_id UUID NOT NULL,
///     change_data TEXT NOT NULL,
///     operation audit_operation NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of mutation an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_operation", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    Created,
    Updated,
    Deleted,
    Restored,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Created => "created",
            AuditOperation::Updated => "updated",
            AuditOperation::Deleted => "deleted",
            AuditOperation::Restored => "restored",
        }
    }
}

/// Persisted audit entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub change_data: String,
    pub operation: AuditOperation,
    pub created_at: DateTime<Utc>,
}

/// Entry waiting in the dispatch queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditLog {
    pub user_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub change_data: String,
    pub operation: AuditOperation,
}

impl AuditLog {
    /// Appends an audit entry.
    pub async fn create(pool: &PgPool, entry: NewAuditLog) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, entity_type, entity_id, change_data, operation)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, entity_type, entity_id, change_data, operation, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.change_data)
        .bind(entry.operation)
        .fetch_one(pool)
        .await
    }

    /// Lists entries for one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, entity_type, entity_id, change_data, operation, created_at
            FROM audit_logs
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(pool)
        .await
    }
}
