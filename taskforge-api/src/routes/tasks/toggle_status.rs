/// Toggle task status endpoint
///
/// # Endpoint
///
/// `PATCH /v1/tasks/:id/toggle-status`
///
/// Advances the workflow one step along the fixed cycle
/// `pending → in_progress → completed → pending` with no request body.
/// The write is version-guarded like a full update, so two concurrent
/// toggles advance the cycle exactly one step total: the loser gets a 409
/// instead of a double-advance.

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
use crate::routes::tasks::{fetch_scoped_task, load_task_body, task_response, TaskResponse};

/// Toggle status handler
pub async fn toggle_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<TaskResponse>> {
    let task = fetch_scoped_task(&state, &auth, id).await?;
    let next = task.status.next();

    let updated = Task::set_status_guarded(&state.db, task.id, task.version, next)
        .await?
        .ok_or_else(|| {
            tracing::warn!(task_id = %task.id, version = task.version, "Version conflict on status toggle");
            ApiError::VersionConflict("Task modified by another user".to_string())
        })?;

    tracing::info!(
        task_id = %updated.id,
        from = task.status.as_str(),
        to = updated.status.as_str(),
        "Task status advanced"
    );

    let include = TaskInclude::from_param(
        params.get("include").map(String::as_str),
        TASK_RELATIONS,
    );
    let task_id = updated.id;
    let body = load_task_body(&state, &include, updated).await?;

    state
        .audit
        .record_entity(auth.user_id, "Task", task_id, AuditOperation::Updated, &body);

    Ok(task_response(body))
}
