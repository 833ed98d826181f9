/// Tag route handlers
///
/// # Endpoints
///
/// - `GET    /v1/tags` — list, ordered by name, both pagination modes
/// - `POST   /v1/tags` — create (admin only)
/// - `GET    /v1/tags/:id` — fetch one
/// - `PUT    /v1/tags/:id` — update (admin only)
/// - `DELETE /v1/tags/:id` — hard delete (admin only)
///
/// Any authenticated caller may read tags; mutations require the admin
/// role and a duplicate name is a 409. Tag deletion is a hard delete,
/// the join rows cascade with it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use taskforge_shared::auth::middleware::AuthContext;
use taskforge_shared::models::audit_log::AuditOperation;
use taskforge_shared::models::tag::{Tag, TagFields};
use taskforge_shared::query::pagination::{CursorPage, OffsetPage, PageRequest, PaginationMode};
use taskforge_shared::query::QueryError;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::routes::tasks::TagBody;

/// Single-tag response envelope.
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub data: TagBody,
}

/// Page envelope in whichever shape the request chose.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListTagsResponse {
    Offset(OffsetPage<TagBody>),
    Cursor(CursorPage<TagBody>),
}

/// Create/update tag request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TagRequest {
    /// Tag name, unique across the system
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Display color (default: gray)
    #[validate(length(max = 32, message = "Color must be at most 32 characters"))]
    pub color: Option<String>,
}

impl TagRequest {
    fn into_fields(self) -> TagFields {
        TagFields {
            name: self.name,
            color: self.color.unwrap_or_else(|| "gray".to_string()),
        }
    }
}

/// Tag listings always order by name; the continuation token only has to
/// remember the boundary name and id.
#[derive(Debug, Serialize, Deserialize)]
struct TagCursor {
    name: String,
    id: Uuid,
}

impl TagCursor {
    fn encode(&self) -> String {
        hex::encode(serde_json::to_vec(self).unwrap_or_default())
    }

    fn decode(token: &str) -> Result<Self, QueryError> {
        let bytes = hex::decode(token).map_err(|_| QueryError::InvalidCursor)?;
        serde_json::from_slice(&bytes).map_err(|_| QueryError::InvalidCursor)
    }
}

fn require_admin(auth: &AuthContext) -> ApiResult<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only admins can manage tags".to_string(),
        ))
    }
}

/// List tags handler
pub async fn list_tags(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListTagsResponse>> {
    let request = PageRequest::from_params(&params);

    let response = match &request.mode {
        PaginationMode::LengthAware { page } => {
            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
                .fetch_one(&state.db)
                .await?;

            let tags: Vec<Tag> = sqlx::query_as(
                "SELECT id, name, color, created_at, updated_at FROM tags \
                 ORDER BY name, id LIMIT $1 OFFSET $2",
            )
            .bind(request.per_page)
            .bind((page - 1).saturating_mul(request.per_page))
            .fetch_all(&state.db)
            .await?;

            ListTagsResponse::Offset(OffsetPage {
                data: tags.into_iter().map(TagBody::from).collect(),
                current_page: *page,
                per_page: request.per_page,
                total,
                last_page: ((total + request.per_page - 1) / request.per_page).max(1),
            })
        }
        PaginationMode::Cursor { cursor } => {
            let mut tags: Vec<Tag> = match cursor {
                Some(token) => {
                    let decoded = TagCursor::decode(token)?;
                    sqlx::query_as(
                        "SELECT id, name, color, created_at, updated_at FROM tags \
                         WHERE (name, id) > ($1, $2) ORDER BY name, id LIMIT $3",
                    )
                    .bind(decoded.name)
                    .bind(decoded.id)
                    .bind(request.per_page + 1)
                    .fetch_all(&state.db)
                    .await?
                }
                None => {
                    sqlx::query_as(
                        "SELECT id, name, color, created_at, updated_at FROM tags \
                         ORDER BY name, id LIMIT $1",
                    )
                    .bind(request.per_page + 1)
                    .fetch_all(&state.db)
                    .await?
                }
            };

            let has_more = tags.len() as i64 > request.per_page;
            tags.truncate(request.per_page as usize);

            let next_cursor = if has_more {
                tags.last().map(|last| {
                    TagCursor {
                        name: last.name.clone(),
                        id: last.id,
                    }
                    .encode()
                })
            } else {
                None
            };

            ListTagsResponse::Cursor(CursorPage {
                data: tags.into_iter().map(TagBody::from).collect(),
                per_page: request.per_page,
                next_cursor,
                has_more,
            })
        }
    };

    Ok(Json(response))
}

/// Get tag handler
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TagResponse>> {
    let tag = Tag::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Ok(Json(TagResponse {
        data: TagBody::from(tag),
    }))
}

/// Create tag handler (admin only)
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<TagRequest>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    require_admin(&auth)?;
    request.validate()?;

    let tag = Tag::create(&state.db, request.into_fields()).await?;

    tracing::info!(tag_id = %tag.id, user_id = %auth.user_id, "Tag created");

    state
        .audit
        .record_entity(auth.user_id, "Tag", tag.id, AuditOperation::Created, &tag);

    Ok((
        StatusCode::CREATED,
        Json(TagResponse {
            data: TagBody::from(tag),
        }),
    ))
}

/// Update tag handler (admin only)
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<TagRequest>,
) -> ApiResult<Json<TagResponse>> {
    require_admin(&auth)?;
    request.validate()?;

    let tag = Tag::update(&state.db, id, request.into_fields())
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    tracing::info!(tag_id = %tag.id, user_id = %auth.user_id, "Tag updated");

    state
        .audit
        .record_entity(auth.user_id, "Tag", tag.id, AuditOperation::Updated, &tag);

    Ok(Json(TagResponse {
        data: TagBody::from(tag),
    }))
}

/// Delete tag handler (admin only)
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    let tag = Tag::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Tag::delete(&state.db, tag.id).await?;

    tracing::info!(tag_id = %tag.id, user_id = %auth.user_id, "Tag deleted");

    state
        .audit
        .record_entity(auth.user_id, "Tag", tag.id, AuditOperation::Deleted, &tag);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_request_defaults_color() {
        let request: TagRequest = serde_json::from_str(r#"{ "name": "backend" }"#).unwrap();
        let fields = request.into_fields();
        assert_eq!(fields.color, "gray");
    }

    #[test]
    fn test_tag_name_bounds() {
        let empty = TagRequest {
            name: String::new(),
            color: None,
        };
        assert!(empty.validate().is_err());

        let valid = TagRequest {
            name: "infrastructure".to_string(),
            color: Some("teal".to_string()),
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_tag_cursor_round_trips() {
        let cursor = TagCursor {
            name: "backend".to_string(),
            id: Uuid::new_v4(),
        };
        let decoded = TagCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.name, cursor.name);
        assert_eq!(decoded.id, cursor.id);

        assert!(TagCursor::decode("zz-not-hex").is_err());
    }
}
