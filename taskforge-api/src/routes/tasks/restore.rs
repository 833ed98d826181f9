/// Restore task endpoint
///
/// # Endpoint
///
/// `PATCH /v1/tasks/:id/restore`
///
/// Brings a soft-deleted task back by clearing `deleted_at`. The lookup
/// deliberately spans deleted rows; restoring a live task is a no-op 200.
/// The response honors `include` like the read endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::collections::HashMap;
use uuid::Uuid;

use taskforge_shared::auth::middleware::AuthContext;
use taskforge_shared::models::audit_log::AuditOperation;
use taskforge_shared::models::task::Task;
use taskforge_shared::query::include::{TaskInclude, TASK_RELATIONS};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::tasks::{load_task_body, task_response, TaskResponse};

/// Restore task handler
pub async fn restore_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id_any(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !auth.is_admin() && task.assigned_to != Some(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have access to this task".to_string(),
        ));
    }

    let include = TaskInclude::from_param(
        params.get("include").map(String::as_str),
        TASK_RELATIONS,
    );

    if !task.is_deleted() {
        let body = load_task_body(&state, &include, task).await?;
        return Ok(task_response(body));
    }

    let restored = Task::restore(&state.db, task.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %restored.id, user_id = %auth.user_id, "Task restored");

    let task_id = restored.id;
    let body = load_task_body(&state, &include, restored).await?;

    state
        .audit
        .record_entity(auth.user_id, "Task", task_id, AuditOperation::Restored, &body);

    Ok(task_response(body))
}
