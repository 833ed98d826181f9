/// Create task endpoint
///
/// # Endpoint
///
/// `POST /v1/tasks`
///
/// # Validation
///
/// - title: 5-255 characters
/// - status: only `pending` or `in_progress` at creation
/// - due_date: strictly after today, when present
/// - metadata: `location` string, `link` http(s) URL, `uuid` parseable
/// - tags: every referenced tag must exist
/// - assigned_to: must reference an existing user
///
/// Non-admin callers can only create tasks assigned to themselves. The
/// response honors the `include` parameter like the read endpoints.
///
/// # Example Request
///
/// ```json
/// {
///   "title": "Write onboarding docs",
///   "priority": "high",
///   "due_date": "2026-09-15",
///   "tags": ["550e8400-e29b-41d4-a716-446655440000"]
/// }
/// ```

use axum::{
    extract::{Query, State},
    http::StatusCode,
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
use taskforge_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
use taskforge_shared::query::include::{TaskInclude, TASK_RELATIONS};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use crate::routes::tasks::{
    load_task_body, task_response, validate_assignee_exists, validate_due_date_future,
    validate_metadata, validate_tags_exist, TaskResponse,
};

/// Create task request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 5, max = 255, message = "Title must be 5-255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial workflow status (default: pending)
    pub status: Option<TaskStatus>,

    /// Priority (default: medium)
    pub priority: Option<TaskPriority>,

    /// Free-form metadata object
    pub metadata: Option<JsonValue>,

    /// Due date, day granularity
    pub due_date: Option<NaiveDate>,

    /// Assignee (admin only; defaults to the caller)
    pub assigned_to: Option<Uuid>,

    /// Tags to attach
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

/// Create task handler
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<HashMap<String, String>>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    request.validate()?;

    let mut errors: Vec<ValidationErrorDetail> = Vec::new();

    let status = request.status.unwrap_or(TaskStatus::Pending);
    if status == TaskStatus::Completed {
        errors.push(ValidationErrorDetail {
            field: "status".to_string(),
            message: "New tasks must start as pending or in_progress".to_string(),
        });
    }

    if let Some(metadata) = &request.metadata {
        validate_metadata(metadata, &mut errors);
    }

    let due_date = request
        .due_date
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());
    if let Some(due) = due_date {
        validate_due_date_future(due, &mut errors);
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
        Some(assignee) => assignee,
        None => auth.user_id,
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            title: request.title,
            description: request.description,
            status,
            priority: request.priority.unwrap_or(TaskPriority::Medium),
            metadata: request.metadata,
            due_date,
            assigned_to: Some(assigned_to),
        },
    )
    .await?;

    if !request.tags.is_empty() {
        Tag::attach_to_task(&state.db, task.id, &request.tags).await?;
    }

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task created");

    let include = TaskInclude::from_param(
        params.get("include").map(String::as_str),
        TASK_RELATIONS,
    );
    let task_id = task.id;
    let body = load_task_body(&state, &include, task).await?;

    // snapshot carries the same relations the caller asked for
    state
        .audit
        .record_entity(auth.user_id, "Task", task_id, AuditOperation::Created, &body);

    Ok((StatusCode::CREATED, task_response(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateTaskRequest {
        CreateTaskRequest {
            title: "Prepare quarterly roadmap".to_string(),
            description: None,
            status: None,
            priority: None,
            metadata: None,
            due_date: None,
            assigned_to: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_title_length_bounds() {
        assert!(base_request().validate().is_ok());

        let mut short = base_request();
        short.title = "Hi".to_string();
        assert!(short.validate().is_err());

        let mut long = base_request();
        long.title = "x".repeat(256);
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_request_deserializes_day_granular_due_date() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{ "title": "Plan release party", "due_date": "2026-12-01" }"#,
        )
        .unwrap();
        assert_eq!(
            request.due_date,
            NaiveDate::from_ymd_opt(2026, 12, 1)
        );
        assert!(request.tags.is_empty());
    }
}
