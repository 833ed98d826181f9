/// List tasks endpoint
///
/// # Endpoint
///
/// `GET /v1/tasks`
///
/// # Query Parameters
///
/// - Filtering: `search`, `full-search`, `status`, `priority`, `tags`,
///   `due-date-from`, `due-date-to`
/// - Scoping: `assigned-to` (admin only; comma-separated user ids)
/// - Sorting: `sort` (comma-separated columns), `sort-type` (`asc`/`desc`)
/// - Inclusion: `include` (`owner`, `tags`)
/// - Pagination: `per-page`, `page` or `pagination-type=cursor` + `cursor`
///
/// Non-admin callers always see only their own assigned tasks; every other
/// parameter narrows within that. Invalid filter values are ignored rather
/// than rejected, but a malformed cursor is a 400 since silently restarting
/// the walk would hand back duplicates.
///
/// # Example Response (cursor mode)
///
/// ```json
/// {
///   "data": [ { "id": "...", "title": "...", "version": 3 } ],
///   "per_page": 15,
///   "next_cursor": "7b2264697265...",
///   "has_more": true
/// }
/// ```

use axum::{extract::Query, extract::State, Extension, Json};
use serde::Serialize;
use std::collections::HashMap;

use taskforge_shared::auth::middleware::AuthContext;
use taskforge_shared::query::filter::TaskFilters;
use taskforge_shared::query::include::{TaskInclude, TASK_RELATIONS};
use taskforge_shared::query::pagination::{
    paginate_tasks, CursorPage, OffsetPage, PageRequest, TaskPage,
};
use taskforge_shared::query::scope::AccessScope;
use taskforge_shared::query::sort::SortSpec;
use taskforge_shared::query::TaskQuery;

use crate::app::AppState;
use crate::error::ApiResult;
use crate::routes::tasks::TaskBody;

/// Page envelope in whichever shape the request chose.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListTasksResponse {
    Offset(OffsetPage<TaskBody>),
    Cursor(CursorPage<TaskBody>),
}

/// List tasks handler
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListTasksResponse>> {
    let scope = AccessScope::for_caller(&auth, params.get("assigned-to").map(String::as_str));
    let filters = TaskFilters::from_params(&params);
    let sort = SortSpec::from_params(
        params.get("sort").map(String::as_str),
        params.get("sort-type").map(String::as_str),
    );
    let include = TaskInclude::from_param(
        params.get("include").map(String::as_str),
        TASK_RELATIONS,
    );
    let request = PageRequest::from_params(&params);

    let query = TaskQuery::new(scope).with_filters(filters).with_sort(sort);
    let page = paginate_tasks(&state.db, &query, &request).await?;

    let response = match page {
        TaskPage::Offset(page) => {
            let OffsetPage {
                data,
                current_page,
                per_page,
                total,
                last_page,
            } = page;
            let data = include
                .load(&state.db, data)
                .await?
                .into_iter()
                .map(TaskBody::from)
                .collect();
            ListTasksResponse::Offset(OffsetPage {
                data,
                current_page,
                per_page,
                total,
                last_page,
            })
        }
        TaskPage::Cursor(page) => {
            let CursorPage {
                data,
                per_page,
                next_cursor,
                has_more,
            } = page;
            let data = include
                .load(&state.db, data)
                .await?
                .into_iter()
                .map(TaskBody::from)
                .collect();
            ListTasksResponse::Cursor(CursorPage {
                data,
                per_page,
                next_cursor,
                has_more,
            })
        }
    };

    Ok(Json(response))
}
