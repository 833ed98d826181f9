/// Delete task endpoint
///
/// # Endpoint
///
/// `DELETE /v1/tasks/:id`
///
/// Soft delete: the row keeps its data and version, gains a `deleted_at`
/// stamp, and disappears from every read path except restore. Repeating
/// the call is a 404 since the live-row lookup no longer finds it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use uuid::Uuid;

use taskforge_shared::auth::middleware::AuthContext;
use taskforge_shared::models::audit_log::AuditOperation;
use taskforge_shared::models::task::Task;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::tasks::fetch_scoped_task;

/// Delete task handler
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = fetch_scoped_task(&state, &auth, id).await?;

    let deleted = Task::soft_delete(&state.db, task.id).await?;
    if !deleted {
        // raced with another delete between fetch and write
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task soft-deleted");

    state.audit.record_entity(
        auth.user_id,
        "Task",
        task.id,
        AuditOperation::Deleted,
        &task,
    );

    Ok(StatusCode::NO_CONTENT)
}
