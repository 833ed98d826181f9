/// Update task endpoint
///
/// # Endpoint
///
/// `PUT /v1/tasks/:id`
///
/// Full-replacement update under optimistic concurrency: the row is
/// fetched, validated against, and then written with a single conditional
/// UPDATE guarded on the fetched version. If any other writer bumped the
/// version in between, the write affects zero rows and the caller gets a
/// 409 with no partial changes applied.
///
/// # Validation
///
/// Same rules as creation, with three differences:
/// - any status is accepted, including `completed`
/// - the future-due-date rule is waived when the task is being completed,
///   so closing out an overdue task does not require rewriting history
/// - the minimum title length only applies when a task is first created;
///   updates keep whatever short title the row already carries
///
/// Tag syncing runs after the guarded write and is skipped entirely when
/// `tags` is absent or empty; an empty list does not clear associations.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use taskforge_shared::auth::middleware::AuthContext;
use taskforge_shared::models::audit_log::AuditOperation;
use taskforge_shared::models::tag::Tag;
use taskforge_shared::models::task::{Task, TaskChanges, TaskPriority, TaskStatus};
use taskforge_shared::query::include::{TaskInclude, TASK_RELATIONS};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use crate::routes::tasks::{
    fetch_scoped_task, load_task_body, task_response, validate_assignee_exists,
    validate_due_date_future, validate_metadata, validate_tags_exist, TaskResponse,
};

/// Update task request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// Task title; the minimum length bound is create-only
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    /// Description; omitting it clears the field
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Free-form metadata object
    pub metadata: Option<JsonValue>,

    /// Due date, day granularity
    pub due_date: Option<NaiveDate>,

    /// Assignee (admin only)
    pub assigned_to: Option<Uuid>,

    /// Replacement tag set; absent or empty leaves associations alone
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

/// Update task handler
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    request.validate()?;

    let current = fetch_scoped_task(&state, &auth, id).await?;

    let mut errors: Vec<ValidationErrorDetail> = Vec::new();

    if let Some(metadata) = &request.metadata {
        validate_metadata(metadata, &mut errors);
    }

    let due_date = request
        .due_date
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());
    if let Some(due) = due_date {
        if request.status != TaskStatus::Completed {
            validate_due_date_future(due, &mut errors);
        }
    }

    errors.extend(validate_tags_exist(&state, &request.tags).await?);
    validate_assignee_exists(&state, request.assigned_to, &mut errors).await?;

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let assigned_to = match request.assigned_to {
        Some(assignee) if !auth.is_admin() && assignee != auth.user_id => {
            return Err(ApiError::Forbidden(
                "Only admins can assign tasks to other users".to_string(),
            ));
        }
        Some(assignee) => Some(assignee),
        None => current.assigned_to,
    };

    let changes = TaskChanges {
        title: request.title,
        description: request.description,
        status: request.status,
        priority: request.priority,
        metadata: request.metadata,
        due_date,
        assigned_to,
    };

    let updated = Task::update_guarded(&state.db, current.id, current.version, changes)
        .await?
        .ok_or_else(|| {
            tracing::warn!(task_id = %current.id, version = current.version, "Version conflict on update");
            ApiError::VersionConflict("Task modified by another user".to_string())
        })?;

    if !request.tags.is_empty() {
        Tag::sync_for_task(&state.db, updated.id, &request.tags).await?;
    }

    tracing::info!(task_id = %updated.id, version = updated.version, "Task updated");

    let include = TaskInclude::from_param(
        params.get("include").map(String::as_str),
        TASK_RELATIONS,
    );
    let task_id = updated.id;
    let body = load_task_body(&state, &include, updated).await?;

    // snapshot carries the same relations the caller asked for
    state
        .audit
        .record_entity(auth.user_id, "Task", task_id, AuditOperation::Updated, &body);

    Ok(task_response(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_requires_full_replacement_fields() {
        let missing_status: Result<UpdateTaskRequest, _> =
            serde_json::from_str(r#"{ "title": "Refresh the deploy runbook" }"#);
        assert!(missing_status.is_err());

        let complete: UpdateTaskRequest = serde_json::from_str(
            r#"{
                "title": "Refresh the deploy runbook",
                "status": "completed",
                "priority": "low"
            }"#,
        )
        .unwrap();
        assert_eq!(complete.status, TaskStatus::Completed);
        assert!(complete.tags.is_empty());
    }

    #[test]
    fn test_short_titles_are_accepted_on_update() {
        let request: UpdateTaskRequest = serde_json::from_str(
            r#"{
                "title": "Okay",
                "status": "pending",
                "priority": "medium"
            }"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let mut long = request;
        long.title = "x".repeat(256);
        assert!(long.validate().is_err());
    }
}
