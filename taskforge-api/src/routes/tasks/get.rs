/// Get task endpoint
///
/// # Endpoint
///
/// `GET /v1/tasks/:id`
///
/// Supports the same `include` parameter as the list endpoint. Non-admins
/// get a 403 for tasks assigned to anyone else, and soft-deleted tasks are
/// a 404 on this path.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::collections::HashMap;
use uuid::Uuid;

use taskforge_shared::auth::middleware::AuthContext;
use taskforge_shared::query::include::{TaskInclude, TASK_RELATIONS};

use crate::app::AppState;
use crate::error::ApiResult;
use crate::routes::tasks::{fetch_scoped_task, load_task_body, task_response, TaskResponse};

/// Get task handler
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<TaskResponse>> {
    let task = fetch_scoped_task(&state, &auth, id).await?;

    let include = TaskInclude::from_param(
        params.get("include").map(String::as_str),
        TASK_RELATIONS,
    );

    let body = load_task_body(&state, &include, task).await?;

    Ok(task_response(body))
}
