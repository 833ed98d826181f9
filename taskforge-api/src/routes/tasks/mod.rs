/// Task route handlers
///
/// One submodule per operation, plus the response bodies and cross-cutting
/// checks they share:
///
/// - `list`: GET /v1/tasks (filter, sort, include, paginate)
/// - `create`: POST /v1/tasks
/// - `get`: GET /v1/tasks/:id
/// - `update`: PUT /v1/tasks/:id (version-guarded)
/// - `delete`: DELETE /v1/tasks/:id (soft delete)
/// - `restore`: PATCH /v1/tasks/:id/restore
/// - `toggle_status`: PATCH /v1/tasks/:id/toggle-status (workflow cycle)

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod restore;
pub mod toggle_status;
pub mod update;

use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use taskforge_shared::auth::middleware::AuthContext;
use taskforge_shared::models::tag::Tag;
use taskforge_shared::models::task::{Task, TaskStatus};
use taskforge_shared::models::user::User;
use taskforge_shared::query::include::{TaskInclude, TaskWithRelations};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};

/// Task representation returned by every task endpoint.
///
/// `owner` and `tags` appear only when the request included them; a task
/// with zero tags under `include=tags` serializes as `"tags": []`, not as
/// an absent key.
#[derive(Debug, Clone, Serialize)]
pub struct TaskBody {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: taskforge_shared::models::task::TaskPriority,
    pub version: i64,
    pub metadata: Option<JsonValue>,
    /// Day granularity, `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub deleted_at: Option<chrono::DateTime<Utc>>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagBody>>,
}

/// User representation embedded under `owner`.
#[derive(Debug, Clone, Serialize)]
pub struct UserBody {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Tag representation embedded under `tags` and returned by tag endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct TagBody {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

impl From<Tag> for TagBody {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
        }
    }
}

impl From<Task> for TaskBody {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            version: task.version,
            metadata: task.metadata,
            due_date: task.due_date.map(|d| d.date_naive().to_string()),
            assigned_to: task.assigned_to,
            deleted_at: task.deleted_at,
            created_at: task.created_at,
            updated_at: task.updated_at,
            owner: None,
            tags: None,
        }
    }
}

impl From<TaskWithRelations> for TaskBody {
    fn from(loaded: TaskWithRelations) -> Self {
        let mut body = TaskBody::from(loaded.task);
        body.owner = loaded.owner.map(UserBody::from);
        body.tags = loaded
            .tags
            .map(|tags| tags.into_iter().map(TagBody::from).collect());
        body
    }
}

/// Single-task response envelope.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub data: TaskBody,
}

pub(crate) fn task_response(body: TaskBody) -> Json<TaskResponse> {
    Json(TaskResponse { data: body })
}

/// Fetches a live task and enforces the caller's scope on it.
///
/// Non-admins may only touch tasks assigned to them; anything else is a
/// 403 even when the row exists.
pub(crate) async fn fetch_scoped_task(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !auth.is_admin() && task.assigned_to != Some(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have access to this task".to_string(),
        ));
    }

    Ok(task)
}

/// Builds the response body for a single task, with whatever relations
/// the request asked for attached. Every endpoint that returns one task
/// funnels through here so `include=` behaves the same on reads and
/// mutations.
pub(crate) async fn load_task_body(
    state: &AppState,
    include: &TaskInclude,
    task: Task,
) -> ApiResult<TaskBody> {
    if include.is_empty() {
        return Ok(TaskBody::from(task));
    }

    let mut loaded = include.load(&state.db, vec![task]).await?;
    // load preserves input order and length; one in, one out
    match loaded.pop() {
        Some(with_relations) => Ok(TaskBody::from(with_relations)),
        None => Err(ApiError::InternalError(
            "Relation loading returned no rows".to_string(),
        )),
    }
}

/// Structural checks on the free-form `metadata` object.
///
/// Only three keys carry rules; everything else passes through untouched.
pub(crate) fn validate_metadata(metadata: &JsonValue, errors: &mut Vec<ValidationErrorDetail>) {
    let Some(object) = metadata.as_object() else {
        errors.push(ValidationErrorDetail {
            field: "metadata".to_string(),
            message: "Metadata must be an object".to_string(),
        });
        return;
    };

    if let Some(location) = object.get("location") {
        if !location.is_string() {
            errors.push(ValidationErrorDetail {
                field: "metadata.location".to_string(),
                message: "Location must be a string".to_string(),
            });
        }
    }

    if let Some(link) = object.get("link") {
        let valid = link
            .as_str()
            .map(|v| v.starts_with("http://") || v.starts_with("https://"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationErrorDetail {
                field: "metadata.link".to_string(),
                message: "Link must be a valid http or https URL".to_string(),
            });
        }
    }

    if let Some(uuid) = object.get("uuid") {
        let valid = uuid
            .as_str()
            .map(|v| v.parse::<Uuid>().is_ok())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationErrorDetail {
                field: "metadata.uuid".to_string(),
                message: "Uuid must be a valid UUID".to_string(),
            });
        }
    }
}

/// Checks that a due date lies strictly in the future (day granularity).
pub(crate) fn validate_due_date_future(
    due_date: chrono::DateTime<Utc>,
    errors: &mut Vec<ValidationErrorDetail>,
) {
    if due_date.date_naive() <= Utc::now().date_naive() {
        errors.push(ValidationErrorDetail {
            field: "due_date".to_string(),
            message: "Due date must be after today".to_string(),
        });
    }
}

/// Verifies an assignee references an existing user. Runs at the boundary
/// so a bogus id surfaces as a field error instead of a store failure.
pub(crate) async fn validate_assignee_exists(
    state: &AppState,
    assigned_to: Option<Uuid>,
    errors: &mut Vec<ValidationErrorDetail>,
) -> ApiResult<()> {
    if let Some(assignee) = assigned_to {
        if User::find_by_id(&state.db, assignee).await?.is_none() {
            errors.push(ValidationErrorDetail {
                field: "assigned_to".to_string(),
                message: "The selected user does not exist".to_string(),
            });
        }
    }
    Ok(())
}

/// Verifies every referenced tag exists, one validation detail per
/// missing id.
pub(crate) async fn validate_tags_exist(
    state: &AppState,
    tag_ids: &[Uuid],
) -> ApiResult<Vec<ValidationErrorDetail>> {
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }

    let missing = Tag::missing_from(&state.db, tag_ids).await?;
    Ok(missing
        .into_iter()
        .map(|id| ValidationErrorDetail {
            field: "tags".to_string(),
            message: format!("Tag {} does not exist", id),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_metadata_rules_only_cover_known_keys() {
        let mut errors = Vec::new();
        validate_metadata(&json!({ "sprint": 42, "notes": ["a", "b"] }), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_metadata_link_requires_http_scheme() {
        let mut errors = Vec::new();
        validate_metadata(&json!({ "link": "ftp://files.example.com" }), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "metadata.link");

        errors.clear();
        validate_metadata(&json!({ "link": "https://example.com/doc" }), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_metadata_uuid_must_parse() {
        let mut errors = Vec::new();
        validate_metadata(&json!({ "uuid": "not-a-uuid" }), &mut errors);
        assert_eq!(errors[0].field, "metadata.uuid");
    }

    #[test]
    fn test_metadata_must_be_an_object() {
        let mut errors = Vec::new();
        validate_metadata(&json!("plain string"), &mut errors);
        assert_eq!(errors[0].field, "metadata");
    }

    #[test]
    fn test_due_date_today_is_rejected() {
        let mut errors = Vec::new();
        validate_due_date_future(Utc::now(), &mut errors);
        assert_eq!(errors.len(), 1);

        errors.clear();
        validate_due_date_future(Utc::now() + Duration::days(2), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_task_body_formats_due_date_as_day() {
        let task = Task {
            id: Uuid::new_v4(),
            title: "Prepare demo".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: taskforge_shared::models::task::TaskPriority::Medium,
            version: 1,
            metadata: None,
            due_date: Some("2026-03-14T09:30:00Z".parse().unwrap()),
            assigned_to: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = TaskBody::from(task);
        assert_eq!(body.due_date.as_deref(), Some("2026-03-14"));
    }

    #[test]
    fn test_relations_serialize_only_when_loaded() {
        let task = Task {
            id: Uuid::new_v4(),
            title: "Untagged".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: taskforge_shared::models::task::TaskPriority::Low,
            version: 1,
            metadata: None,
            due_date: None,
            assigned_to: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let bare = serde_json::to_value(TaskBody::from(task.clone())).unwrap();
        assert!(bare.get("tags").is_none());
        assert!(bare.get("owner").is_none());

        let loaded = TaskBody::from(TaskWithRelations {
            task,
            owner: None,
            tags: Some(vec![]),
        });
        let value = serde_json::to_value(loaded).unwrap();
        assert_eq!(value.get("tags"), Some(&json!([])));
    }
}
